use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use burn::{
    data::dataloader,
    tensor::{backend::Backend, Int, Tensor},
};
use derive_new::new;

use crate::{
    utils::{
        classes::{index_labels, invert_map},
        tensors::{class_ids, pad_to},
    },
    vocab::{Tokenizer, Vocabulary, PAD_INDEX},
};

use super::Item;

/// An inference batch for text classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Token ids, right-padded with [`PAD_INDEX`]: [batch_size, seq_length]
    pub tokens: Tensor<B, 2, Int>,
}

/// A training batch for text classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Model input
    pub input: Infer<B>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching text classification items.
///
/// Each batch is padded to its longest sequence, but never below `min_seq_length` so every
/// convolution branch has something to slide over.
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// Tokenizer for splitting review text
    tokenizer: Tokenizer,

    /// Vocabulary built from the training split
    vocab: Arc<Vocabulary>,

    /// A mapping from class name labels to class ids
    label2id: BTreeMap<String, usize>,

    /// Shortest padded sequence length
    min_seq_length: usize,

    /// Optional cap on the sequence length
    max_seq_length: Option<usize>,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher
    pub fn new(
        vocab: Arc<Vocabulary>,
        labels: &[String],
        min_seq_length: usize,
        max_seq_length: Option<usize>,
        device: B::Device,
    ) -> Self {
        let id2label: BTreeMap<usize, String> = index_labels(labels);

        Self {
            tokenizer: Tokenizer::default(),
            vocab,
            label2id: invert_map(id2label),
            min_seq_length: min_seq_length.max(1),
            max_seq_length,
            device,
        }
    }

    /// Tokenize text and map it to vocabulary indexes
    pub fn encode(&self, text: &str) -> Vec<usize> {
        self.vocab.encode(&self.tokenizer.tokenize(text))
    }

    /// The padded length for a batch whose longest sequence is `longest`
    fn seq_length(&self, longest: usize) -> usize {
        let length = longest.max(self.min_seq_length);

        match self.max_seq_length {
            Some(max) => length.min(max.max(self.min_seq_length)),
            None => length,
        }
    }

    fn class_id(&self, label: &str) -> usize {
        self.label2id.get(label).copied().unwrap_or_else(|| {
            log::warn!("Unknown class label {:?}, using class 0", label);

            0
        })
    }
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<String, Infer<B>> for Batcher<B> {
    /// Collects a vector of raw texts into an inference batch
    fn batch(&self, items: Vec<String>) -> Infer<B> {
        let token_ids_list: Vec<Vec<usize>> = items.iter().map(|text| self.encode(text)).collect();

        let longest = token_ids_list.iter().map(Vec::len).max().unwrap_or(0);

        Infer {
            tokens: pad_to(
                PAD_INDEX,
                token_ids_list,
                self.seq_length(longest),
                &self.device,
            ),
        }
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend, I: Item> dataloader::batcher::Batcher<I, Train<B>> for Batcher<B> {
    /// Collects a vector of text classification items into a training batch
    fn batch(&self, items: Vec<I>) -> Train<B> {
        let inputs: Vec<String> = items.iter().map(|item| item.input().to_string()).collect();
        let input = dataloader::batcher::Batcher::<String, Infer<B>>::batch(self, inputs);

        let class_id_list: Vec<usize> = items
            .iter()
            .map(|item| self.class_id(item.class_label()))
            .collect();

        Train {
            input,
            targets: class_ids(&class_id_list, &self.device),
        }
    }
}
