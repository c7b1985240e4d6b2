use async_trait::async_trait;
use burn::data::dataset::{Dataset, InMemDataset};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

///  The IMDB movie review dataset
pub mod imdb;

/// A dataset which can be loaded
#[async_trait]
pub trait LoadableDataset<I>: burn::data::dataset::Dataset<I> {
    /// Load the dataset
    async fn load(data_dir: &str, mode: &str) -> Result<Self, DatasetError>
    where
        Self: std::marker::Sized;
}

/// Shuffle a dataset with a fixed seed and cut it in two, the first part holding `ratio` of the
/// items
pub fn split<I, D>(dataset: &D, ratio: f64, seed: u64) -> (InMemDataset<I>, InMemDataset<I>)
where
    I: Clone + Send + Sync,
    D: Dataset<I>,
{
    let mut items: Vec<I> = dataset.iter().collect();

    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let cut = (items.len() as f64 * ratio.clamp(0.0, 1.0)).round() as usize;
    let rest = items.split_off(cut);

    (InMemDataset::new(items), InMemDataset::new(rest))
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// The dataset file could not be read or parsed
    #[error("unable to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// An item carries a label outside the dataset's classes
    #[error("item {index} has unknown label {label:?}")]
    Label {
        /// The index of the item within the file
        index: usize,
        /// The unrecognized label
        label: String,
    },
}
