//! Model configuration and the embedding initialization policy

use std::{fmt::Display, str::FromStr};

use burn::{
    module::{Module, Param},
    nn::{
        conv::Conv1dConfig, DropoutConfig, Embedding, EmbeddingConfig, EmbeddingRecord,
        LinearConfig,
    },
    tensor::{backend::Backend, Tensor},
};
use serde::{Deserialize, Serialize};

use crate::vocab::{PretrainedEmbeddings, PAD_INDEX};

use super::TextCnn;

/// How the embedding table is initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Burn's default random initialization with the padding row zeroed, trained with the rest
    /// of the model
    #[serde(alias = "rand")]
    Random,

    /// Copied from pretrained vectors and frozen
    Static,

    /// Copied from pretrained vectors and fine-tuned
    #[serde(alias = "non-static")]
    NonStatic,
}

impl EmbeddingMode {
    /// Whether this mode starts from a pretrained matrix
    pub fn requires_pretrained(&self) -> bool {
        match self {
            EmbeddingMode::Random => false,
            EmbeddingMode::Static | EmbeddingMode::NonStatic => true,
        }
    }
}

impl TryFrom<&str> for EmbeddingMode {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "rand" | "random" => Ok(EmbeddingMode::Random),
            "static" => Ok(EmbeddingMode::Static),
            "nonstatic" | "non-static" => Ok(EmbeddingMode::NonStatic),
            _ => Err(ConfigError::UnknownMode(value.to_string())),
        }
    }
}

impl FromStr for EmbeddingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl Display for EmbeddingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EmbeddingMode::Random => "random",
            EmbeddingMode::Static => "static",
            EmbeddingMode::NonStatic => "nonstatic",
        };

        write!(f, "{}", name)
    }
}

/// The Model Configuration
#[derive(burn::config::Config)]
pub struct TextCnnConfig {
    /// Number of rows in the embedding table
    pub vocab_size: usize,

    /// Width of each embedding vector
    #[config(default = 100)]
    pub embedding_dim: usize,

    /// One convolution branch per kernel size, in concatenation order
    #[config(default = "vec![3, 4, 5]")]
    pub kernel_sizes: Vec<usize>,

    /// Output channels per convolution branch
    #[config(default = 100)]
    pub num_filters: usize,

    /// Number of sigmoid outputs (1 for binary classification)
    #[config(default = 1)]
    pub num_classes: usize,

    /// Dropout applied to the sentence embedding
    #[config(default = 0.5)]
    pub dropout: f64,

    /// Embedding initialization policy
    #[config(default = "EmbeddingMode::Static")]
    pub mode: EmbeddingMode,
}

impl TextCnnConfig {
    /// Check the hyperparameters without building anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("vocab_size", self.vocab_size),
            ("embedding_dim", self.embedding_dim),
            ("num_filters", self.num_filters),
            ("num_classes", self.num_classes),
        ];

        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NotPositive(*name));
        }

        if self.kernel_sizes.is_empty() {
            return Err(ConfigError::NoKernels);
        }

        if self.kernel_sizes.contains(&0) {
            return Err(ConfigError::NotPositive("kernel_sizes"));
        }

        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConfigError::Dropout(self.dropout));
        }

        Ok(())
    }

    /// Kernel sizes with duplicates removed, keeping the first occurrence
    pub fn distinct_kernel_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.kernel_sizes.len());

        for size in &self.kernel_sizes {
            if !sizes.contains(size) {
                sizes.push(*size);
            }
        }

        sizes
    }

    /// The shortest input the model accepts: the largest kernel size
    pub fn min_seq_length(&self) -> usize {
        self.kernel_sizes.iter().copied().max().unwrap_or(1)
    }

    /// Width of the concatenated, max-pooled convolution features
    pub fn sentence_embedding_width(&self) -> usize {
        self.num_filters * self.distinct_kernel_sizes().len()
    }

    /// Build the model, initializing the embedding table according to the configured mode.
    ///
    /// `static` and `nonstatic` require a pretrained matrix of `vocab_size x embedding_dim`.
    pub fn init<B: Backend>(
        &self,
        pretrained: Option<&PretrainedEmbeddings>,
        device: &B::Device,
    ) -> Result<TextCnn<B>, ConfigError> {
        self.validate()?;

        let embedding = match self.mode {
            EmbeddingMode::Random => self.random_embedding(device),
            EmbeddingMode::Static => self.pretrained_embedding(pretrained, device)?.no_grad(),
            EmbeddingMode::NonStatic => self.pretrained_embedding(pretrained, device)?,
        };

        Ok(self.build(embedding, device))
    }

    /// Build the model with an embedding mode given by name, as read from the command line
    pub fn init_with_mode<B: Backend>(
        &self,
        mode: &str,
        pretrained: Option<&PretrainedEmbeddings>,
        device: &B::Device,
    ) -> Result<TextCnn<B>, ConfigError> {
        let mode = EmbeddingMode::try_from(mode)?;

        self.clone().with_mode(mode).init(pretrained, device)
    }

    /// Build a model skeleton to load a saved record into.
    ///
    /// The embedding table is left random since the record overwrites it.
    pub fn init_for_record<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<TextCnn<B>, ConfigError> {
        self.validate()?;

        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        let embedding = match self.mode {
            EmbeddingMode::Static => embedding.no_grad(),
            EmbeddingMode::Random | EmbeddingMode::NonStatic => embedding,
        };

        Ok(self.build(embedding, device))
    }

    fn build<B: Backend>(&self, embedding: Embedding<B>, device: &B::Device) -> TextCnn<B> {
        let convs = self
            .distinct_kernel_sizes()
            .into_iter()
            .map(|kernel_size| {
                Conv1dConfig::new(self.embedding_dim, self.num_filters, kernel_size).init(device)
            })
            .collect();

        let dropout = DropoutConfig::new(self.dropout).init();
        let output =
            LinearConfig::new(self.sentence_embedding_width(), self.num_classes).init(device);

        TextCnn {
            embedding,
            convs,
            dropout,
            output,
            n_classes: self.num_classes,
            min_seq_length: self.min_seq_length(),
        }
    }

    fn random_embedding<B: Backend>(&self, device: &B::Device) -> Embedding<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);

        if self.vocab_size <= PAD_INDEX {
            return embedding;
        }

        // Padding positions start out contributing nothing. The record must hold a leaf tensor.
        let weight = embedding
            .weight
            .val()
            .slice_assign(
                [PAD_INDEX..PAD_INDEX + 1, 0..self.embedding_dim],
                Tensor::zeros([1, self.embedding_dim], device),
            )
            .detach();

        embedding.load_record(EmbeddingRecord {
            weight: Param::from_tensor(weight),
        })
    }

    fn pretrained_embedding<B: Backend>(
        &self,
        pretrained: Option<&PretrainedEmbeddings>,
        device: &B::Device,
    ) -> Result<Embedding<B>, ConfigError> {
        let pretrained = pretrained.ok_or(ConfigError::MissingPretrained(self.mode))?;

        if pretrained.rows() != self.vocab_size || pretrained.dim() != self.embedding_dim {
            return Err(ConfigError::PretrainedShape {
                rows: pretrained.rows(),
                cols: pretrained.dim(),
                vocab_size: self.vocab_size,
                embedding_dim: self.embedding_dim,
            });
        }

        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);

        Ok(embedding.load_record(EmbeddingRecord {
            weight: Param::from_tensor(pretrained.to_tensor(device)),
        }))
    }
}

/// Model Configuration Error
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The embedding mode is not one of random, static or nonstatic
    #[error("unknown embedding mode {0:?}, expected one of rand, static, nonstatic")]
    UnknownMode(String),

    /// A size hyperparameter is zero
    #[error("{0} must be positive")]
    NotPositive(&'static str),

    /// No convolution branches are configured
    #[error("at least one kernel size is required")]
    NoKernels,

    /// The dropout probability is outside [0, 1)
    #[error("dropout must be in [0, 1), got {0}")]
    Dropout(f64),

    /// A pretrained mode was selected without pretrained vectors
    #[error("the {0} embedding mode requires pretrained embeddings")]
    MissingPretrained(EmbeddingMode),

    /// The pretrained matrix does not match the embedding table
    #[error("pretrained embeddings are {rows}x{cols}, expected {vocab_size}x{embedding_dim}")]
    PretrainedShape {
        /// Rows in the supplied matrix
        rows: usize,
        /// Columns in the supplied matrix
        cols: usize,
        /// Configured vocabulary size
        vocab_size: usize,
        /// Configured embedding dimension
        embedding_dim: usize,
    },
}
