use burn::LearningRate;

use crate::models::MODEL_NAME;

use super::PIPELINE;

/// Define configuration struct for the experiment
#[derive(burn::config::Config)]
pub struct Config {
    /// Batch size
    #[config(default = 32)]
    pub batch_size: usize,

    /// Number of epochs
    #[config(default = 20)]
    pub num_epochs: usize,

    /// Adam epsilon
    #[config(default = 1e-8)]
    pub adam_epsilon: f32,

    /// Learning rate, constant across training
    #[config(default = 1e-3)]
    pub learning_rate: LearningRate,

    /// Seed for the train/validation split and batch shuffling
    #[config(default = 42)]
    pub seed: u64,

    /// Share of the training file kept for training, the rest is used for validation
    #[config(default = 0.8)]
    pub train_ratio: f64,

    /// Stop after this many epochs without a lower validation loss
    #[config(default = 5)]
    pub early_stopping_patience: usize,

    /// Number of per-epoch checkpoints to keep
    #[config(default = 2)]
    pub checkpoints_kept: usize,

    /// Log training metrics every this many iterations when the TUI is disabled
    #[config(default = 100)]
    pub log_interval: usize,

    /// Most frequent training tokens kept in the vocabulary
    #[config(default = 25000)]
    pub max_vocab_size: usize,

    /// Tokens seen fewer times than this map to `<unk>`
    #[config(default = 1)]
    pub min_freq: usize,

    /// Optional cap on review length, in tokens
    pub max_seq_length: Option<usize>,

    /// Cohen's kappa weighting for the final evaluation: none, linear or quadratic
    pub kappa_weighting: Option<String>,

    /// Data loader worker threads
    #[config(default = 4)]
    pub num_workers: usize,

    /// The location of the top-level data directory
    #[config(default = "\"data\".to_string()")]
    pub data_dir: String,

    /// Class labels for the selected dataset
    pub labels: Vec<String>,
}

impl Config {
    /// Where the trained model, its configuration and checkpoints are written
    pub fn artifact_dir(&self) -> String {
        format!("{}/{}/{}", self.data_dir, PIPELINE, MODEL_NAME)
    }
}
