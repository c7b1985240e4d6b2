/// Review text tokenization
pub mod tokenizer;

/// Token <-> index mapping
pub mod vocabulary;

/// Pretrained word vectors aligned to a vocabulary
pub mod embeddings;

pub use embeddings::{EmbeddingsError, PretrainedEmbeddings};
pub use tokenizer::Tokenizer;
pub use vocabulary::{Vocabulary, VocabularyError, PAD_INDEX, PAD_TOKEN, UNK_INDEX, UNK_TOKEN};
