use std::path::Path;

use burn::tensor::{backend::Backend, Data, ElementConversion, Shape, Tensor};

use crate::utils::files::read_lines;

use super::Vocabulary;

/// A pretrained embedding matrix, one row per vocabulary entry
#[derive(Debug, Clone, PartialEq)]
pub struct PretrainedEmbeddings {
    dim: usize,
    values: Vec<f32>,
}

impl PretrainedEmbeddings {
    /// Wrap a row-major `rows x dim` matrix
    pub fn new(rows: usize, dim: usize, values: Vec<f32>) -> Result<Self, EmbeddingsError> {
        if values.len() != rows * dim {
            return Err(EmbeddingsError::Shape {
                expected: rows * dim,
                found: values.len(),
            });
        }

        Ok(Self { dim, values })
    }

    /// An all-zero matrix
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self {
            dim,
            values: vec![0.0; rows * dim],
        }
    }

    /// Align GloVe-format lines (`word v1 v2 ... vdim`) to a vocabulary.
    ///
    /// Words outside the vocabulary are ignored, and vocabulary entries missing from the input
    /// keep a zero vector.
    pub fn from_glove_lines<I, S>(
        lines: I,
        vocab: &Vocabulary,
        dim: usize,
    ) -> Result<Self, EmbeddingsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut embeddings = Self::zeros(vocab.len(), dim);

        for (index, line) in lines.into_iter().enumerate() {
            embeddings.insert_glove_line(line.as_ref(), index + 1, vocab)?;
        }

        Ok(embeddings)
    }

    /// Stream a GloVe text file from disk and align it to a vocabulary
    pub async fn load_glove<P: AsRef<Path>>(
        path: P,
        vocab: &Vocabulary,
        dim: usize,
    ) -> Result<Self, EmbeddingsError> {
        let mut embeddings = Self::zeros(vocab.len(), dim);
        let mut lines = read_lines(path.as_ref()).await?;

        let mut line_number = 0;
        let mut found = 0;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;

            if embeddings.insert_glove_line(&line, line_number, vocab)? {
                found += 1;
            }
        }

        log::info!(
            "Loaded {} pretrained vectors for a vocabulary of {} from {}",
            found,
            vocab.len(),
            path.as_ref().display()
        );

        Ok(embeddings)
    }

    /// Parse one line and store its vector, returning whether the word was in the vocabulary.
    ///
    /// The last `dim` fields are the vector, and everything before them is the word, which may
    /// itself contain spaces. Lines too short to hold a word and a vector are skipped.
    fn insert_glove_line(
        &mut self,
        line: &str,
        line_number: usize,
        vocab: &Vocabulary,
    ) -> Result<bool, EmbeddingsError> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.is_empty() {
            return Ok(false);
        }

        if fields.len() <= self.dim {
            log::warn!(
                "Skipping line {}: expected a word and {} components, found {} fields",
                line_number,
                self.dim,
                fields.len()
            );

            return Ok(false);
        }

        let (words, components) = fields.split_at(fields.len() - self.dim);

        let vector = components
            .iter()
            .map(|value| {
                value.parse::<f32>().map_err(|_| EmbeddingsError::Parse {
                    line: line_number,
                    value: value.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let Some(index) = vocab.get(&words.join(" ")) else {
            return Ok(false);
        };

        let start = index * self.dim;
        self.values[start..start + self.dim].copy_from_slice(&vector);

        Ok(true)
    }

    /// The number of rows
    pub fn rows(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.values.len() / self.dim
        }
    }

    /// The width of each vector
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The row-major matrix values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// The vector for a single vocabulary index
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index * self.dim;

        self.values.get(start..start + self.dim)
    }

    /// Copy the matrix onto a device as a `[rows, dim]` tensor
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let data: Data<B::FloatElem, 2> = Data::new(
            self.values.iter().map(|value| (*value).elem()).collect(),
            Shape::new([self.rows(), self.dim]),
        );

        Tensor::from_data(data, device)
    }
}

/// Pretrained Embeddings Error
#[derive(thiserror::Error, Debug)]
pub enum EmbeddingsError {
    /// The embeddings file could not be read
    #[error("unable to read embeddings: {0}")]
    Io(#[from] std::io::Error),

    /// A vector component is not a number
    #[error("line {line}: invalid vector component {value:?}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// The offending field
        value: String,
    },

    /// A raw matrix does not match its declared shape
    #[error("expected {expected} values, found {found}")]
    Shape {
        /// rows * dim
        expected: usize,
        /// The number of values supplied
        found: usize,
    },
}
