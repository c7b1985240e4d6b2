use async_trait::async_trait;
use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

use crate::pipelines::text_classification;

use super::{DatasetError, LoadableDataset};

/// The name of the IMDB dataset
pub static DATASET: &str = "imdb";

/// Sentiment labels, in class id order
pub static LABELS: [&str; 2] = ["negative", "positive"];

/// A labelled movie review
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// The review text
    pub review: String,

    /// Either "negative" or "positive"
    pub sentiment: String,
}

impl text_classification::Item for Item {
    fn input(&self) -> &str {
        &self.review
    }

    fn class_label(&self) -> &str {
        &self.sentiment
    }
}

/// Struct for the IMDB dataset
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,
}

/// Implement the Dataset trait for the IMDB dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

#[async_trait]
impl LoadableDataset<Item> for Dataset {
    /// Constructs the dataset for a mode (either "train" or "test") from
    /// `{data_dir}/datasets/imdb/{mode}.csv`, with `review` and `sentiment` columns
    async fn load(data_dir: &str, mode: &str) -> Result<Self, DatasetError> {
        let path = format!("{}/datasets/{}/{}.csv", data_dir, DATASET, mode);
        let reader = csv::ReaderBuilder::new();

        let dataset: InMemDataset<Item> = InMemDataset::from_csv(&path, &reader)?;

        log::info!("Loaded {} reviews from {}", dataset.len(), path);

        Self::from_items(dataset.iter().collect())
    }
}

impl Dataset {
    /// Build the dataset from items, rejecting unknown sentiment labels
    pub fn from_items(items: Vec<Item>) -> Result<Self, DatasetError> {
        if let Some((index, item)) = items
            .iter()
            .enumerate()
            .find(|(_, item)| !LABELS.contains(&item.sentiment.as_str()))
        {
            return Err(DatasetError::Label {
                index,
                label: item.sentiment.clone(),
            });
        }

        Ok(Self {
            dataset: InMemDataset::new(items),
        })
    }

    /// The class labels, in class id order
    pub fn labels() -> Vec<String> {
        LABELS.iter().map(|label| label.to_string()).collect()
    }

    /// Split off a validation set with a fixed seed, keeping `ratio` of the reviews for training
    pub fn split(&self, ratio: f64, seed: u64) -> (Self, Self) {
        let (train, valid) = super::split(self, ratio, seed);

        (Self { dataset: train }, Self { dataset: valid })
    }

    /// Returns random (review, sentiment) samples from the dataset
    pub async fn get_samples(
        data_dir: &str,
        mode: &str,
        count: usize,
    ) -> Result<Vec<(String, String)>, DatasetError> {
        let mut rng = rand::thread_rng();

        let data = Self::load(data_dir, mode).await?;
        let count = count.min(data.len());

        let samples = sample(&mut rng, data.len(), count)
            .into_iter()
            .filter_map(|i| data.get(i))
            .map(|item| (item.review, item.sentiment))
            .collect();

        Ok(samples)
    }
}
