use tokenizers::{
    pre_tokenizers::whitespace::Whitespace, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer,
};

/// HTML line breaks scattered through scraped movie reviews
static LINE_BREAK: &str = "<br />";

/// Splits review text into lower-cased word and punctuation tokens
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    pre_tokenizer: Whitespace,
}

impl Tokenizer {
    /// Tokenize a single review
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned = text.replace(LINE_BREAK, " ").to_lowercase();

        let mut pretokenized = PreTokenizedString::from(cleaned.as_str());

        if let Err(err) = self.pre_tokenizer.pre_tokenize(&mut pretokenized) {
            log::warn!("Falling back to whitespace splitting: {}", err);

            return cleaned.split_whitespace().map(str::to_string).collect();
        }

        pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(token, _, _)| token.to_string())
            .collect()
    }
}
