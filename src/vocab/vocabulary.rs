use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::utils::classes::invert_map;

/// The token substituted for anything outside the vocabulary
pub static UNK_TOKEN: &str = "<unk>";

/// The token used to right-pad sequences within a batch
pub static PAD_TOKEN: &str = "<pad>";

/// Index of [`UNK_TOKEN`]
pub const UNK_INDEX: usize = 0;

/// Index of [`PAD_TOKEN`], shared by the batcher and the model
pub const PAD_INDEX: usize = 1;

/// A bidirectional mapping between tokens and indexes.
///
/// Serialized as the list of tokens in index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    itos: Vec<String>,
    stoi: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from tokenized training documents.
    ///
    /// Tokens are ordered by descending frequency, ties broken alphabetically. `max_size` does
    /// not count the special tokens.
    pub fn build<I, T>(documents: I, max_size: Option<usize>, min_freq: usize) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = String>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();

        for document in documents {
            for token in document {
                *counts.entry(token).or_default() += 1;
            }
        }

        let min_freq = min_freq.max(1);

        let mut tokens: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(token, count)| {
                *count >= min_freq && token != UNK_TOKEN && token != PAD_TOKEN
            })
            .collect();

        tokens.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then_with(|| a.cmp(b)));

        if let Some(max_size) = max_size {
            tokens.truncate(max_size);
        }

        let itos: Vec<String> = [UNK_TOKEN, PAD_TOKEN]
            .into_iter()
            .map(str::to_string)
            .chain(tokens.into_iter().map(|(token, _)| token))
            .collect();

        Self::from(itos)
    }

    /// The number of entries, including the special tokens
    pub fn len(&self) -> usize {
        self.itos.len()
    }

    /// Whether the vocabulary has no entries at all
    pub fn is_empty(&self) -> bool {
        self.itos.is_empty()
    }

    /// The index of a token, if it is part of the vocabulary
    pub fn get(&self, token: &str) -> Option<usize> {
        self.stoi.get(token).copied()
    }

    /// The index of a token, falling back to [`UNK_INDEX`]
    pub fn lookup(&self, token: &str) -> usize {
        self.get(token).unwrap_or(UNK_INDEX)
    }

    /// Map a token sequence to indexes
    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<usize> {
        tokens.iter().map(|token| self.lookup(token.as_ref())).collect()
    }

    /// The token at an index
    pub fn token(&self, index: usize) -> Option<&str> {
        self.itos.get(index).map(String::as_str)
    }

    /// Write the vocabulary to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), VocabularyError> {
        let writer = BufWriter::new(File::create(path)?);

        serde_json::to_writer(writer, self)?;

        Ok(())
    }

    /// Read a vocabulary written by [`Vocabulary::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VocabularyError> {
        let reader = BufReader::new(File::open(path)?);

        Ok(serde_json::from_reader(reader)?)
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(itos: Vec<String>) -> Self {
        let stoi = invert_map(itos.iter().cloned().enumerate());

        Self { itos, stoi }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.itos
    }
}

/// Vocabulary Error
#[derive(thiserror::Error, Debug)]
pub enum VocabularyError {
    /// The vocabulary file could not be read or written
    #[error("vocabulary file error: {0}")]
    Io(#[from] std::io::Error),

    /// The vocabulary file is not a JSON list of tokens
    #[error("invalid vocabulary file: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn documents() -> Vec<Vec<String>> {
        [
            "the movie was great",
            "the plot was thin",
            "the acting was great",
        ]
        .iter()
        .map(|doc| doc.split(' ').map(str::to_string).collect())
        .collect()
    }

    #[test]
    fn test_build_reserves_special_indexes() {
        let vocab = Vocabulary::build(documents(), None, 1);

        assert_eq!(vocab.token(UNK_INDEX), Some(UNK_TOKEN));
        assert_eq!(vocab.token(PAD_INDEX), Some(PAD_TOKEN));
        assert_eq!(vocab.len(), 2 + 7);
    }

    #[test]
    fn test_build_orders_by_frequency_then_alphabetically() {
        let vocab = Vocabulary::build(documents(), None, 1);

        assert_eq!(vocab.lookup("the"), 2);
        assert_eq!(vocab.lookup("was"), 3);
        assert_eq!(vocab.lookup("great"), 4);
        assert_eq!(vocab.lookup("acting"), 5);
        assert_eq!(vocab.lookup("thin"), 8);
    }

    #[test]
    fn test_build_respects_min_freq_and_max_size() {
        let frequent = Vocabulary::build(documents(), None, 2);
        assert_eq!(frequent.len(), 2 + 3);
        assert_eq!(frequent.get("plot"), None);

        let capped = Vocabulary::build(documents(), Some(2), 1);
        assert_eq!(capped.len(), 2 + 2);
        assert_eq!(capped.get("great"), None);
    }

    #[test]
    fn test_unknown_tokens_map_to_unk() {
        let vocab = Vocabulary::build(documents(), None, 1);

        assert_eq!(
            vocab.encode(&["the", "dreadful", "plot"]),
            vec![2, UNK_INDEX, vocab.lookup("plot")]
        );
    }

    #[test]
    fn test_save_and_load() -> Result<(), VocabularyError> {
        let vocab = Vocabulary::build(documents(), None, 1);
        let path = std::env::temp_dir().join("textcnn-burn-vocab-test.json");

        vocab.save(&path)?;

        assert_eq!(Vocabulary::load(&path)?, vocab);

        Ok(())
    }
}
