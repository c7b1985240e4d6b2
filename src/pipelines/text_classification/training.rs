use std::sync::Arc;

use burn::{
    config::Config as _,
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::{AutodiffModule, Module},
    optim::AdamConfig,
    record::{CompactRecorder, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
    train::{
        checkpoint::KeepLastNCheckpoints,
        metric::{
            store::{Aggregate, Direction, Split},
            AccuracyMetric, LossMetric,
        },
        LearnerBuilder, MetricEarlyStoppingStrategy, StoppingCondition,
    },
};

use crate::{
    models::text_cnn::{TextCnn, TextCnnConfig},
    utils::renderer,
    vocab::{PretrainedEmbeddings, Tokenizer, Vocabulary},
};

use super::{
    batcher::Train,
    kappa::{CohenKappa, Weighting},
    Batcher, ClassificationReport, Config, Item,
};

/// Build the vocabulary from the training split only
pub fn build_vocab<I: Item, D: Dataset<I>>(dataset: &D, config: &Config) -> Vocabulary {
    let tokenizer = Tokenizer::default();

    let vocab = Vocabulary::build(
        dataset.iter().map(|item| tokenizer.tokenize(item.input())),
        Some(config.max_vocab_size),
        config.min_freq,
    );

    log::info!(
        "Built a vocabulary of {} tokens from {} training items",
        vocab.len(),
        dataset.len()
    );

    vocab
}

/// Define train function
#[allow(clippy::too_many_arguments)]
pub fn train<B, I, D>(
    devices: Vec<B::Device>, // Device on which to perform computation (e.g., CPU or CUDA device)
    dataset_train: D,        // Training dataset
    dataset_valid: D,        // Validation dataset
    vocab: Vocabulary,       // Vocabulary built from the training dataset
    embeddings: Option<PretrainedEmbeddings>, // Pretrained vectors aligned to the vocabulary
    model_config: TextCnnConfig, // Model hyperparameters
    config: Config,          // Experiment configuration
    use_tui: bool,           // Render progress with the terminal UI rather than the log
) -> anyhow::Result<TextCnn<B>>
where
    B: AutodiffBackend,
    I: Item + 'static,
    D: Dataset<I> + 'static,
{
    let device = devices
        .first()
        .ok_or_else(|| anyhow!("At least one device is required for training"))?
        .clone();
    let artifact_dir = config.artifact_dir();

    let weighting = Weighting::from_name(config.kappa_weighting.as_deref())?;

    std::fs::create_dir_all(&artifact_dir)?;

    B::seed(config.seed);

    let model = model_config.init::<B>(embeddings.as_ref(), &device)?;

    log::info!(
        "Training TextCNN ({} mode, kernels {:?}, {} filters) on {} items, validating on {}",
        model_config.mode,
        model_config.distinct_kernel_sizes(),
        model_config.num_filters,
        dataset_train.len(),
        dataset_valid.len()
    );

    let vocab = Arc::new(vocab);

    // Initialize batchers for training and validation data
    let batcher_train = Batcher::<B>::new(
        vocab.clone(),
        &config.labels,
        model_config.min_seq_length(),
        config.max_seq_length,
        device.clone(),
    );
    let batcher_valid = Batcher::<B::InnerBackend>::new(
        vocab.clone(),
        &config.labels,
        model_config.min_seq_length(),
        config.max_seq_length,
        device.clone(),
    );

    // Initialize data loaders for training and validation data
    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers.max(1))
        .build(dataset_train);

    let dataloader_valid = DataLoaderBuilder::new(batcher_valid)
        .batch_size(config.batch_size)
        .num_workers(config.num_workers.max(1))
        .build(dataset_valid);

    // Initialize optimizer
    let optimizer = AdamConfig::new().with_epsilon(config.adam_epsilon).init();

    // Initialize learner
    let mut builder = LearnerBuilder::new(&artifact_dir)
        .metric_train_numeric(AccuracyMetric::new())
        .metric_valid_numeric(AccuracyMetric::new())
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .with_file_checkpointer(CompactRecorder::new());

    builder.with_checkpointing_strategy(KeepLastNCheckpoints::new(config.checkpoints_kept));

    let builder = builder
        .early_stopping(MetricEarlyStoppingStrategy::new::<LossMetric<B>>(
            Aggregate::Mean,
            Direction::Lowest,
            Split::Valid,
            StoppingCondition::NoImprovementSince {
                n_epochs: config.early_stopping_patience,
            },
        ))
        .devices(devices)
        .num_epochs(config.num_epochs)
        .summary();

    let builder = if use_tui {
        builder
    } else {
        builder.renderer(renderer::Log::new(config.log_interval))
    };

    let learner = builder.build(model, optimizer, config.learning_rate);

    // Train the model
    let model_trained = learner.fit(dataloader_train, dataloader_valid.clone());

    // Save the configuration, vocabulary and the trained model
    model_config
        .save(format!("{artifact_dir}/config.json"))
        .map_err(|e| anyhow!("Unable to save model config: {}", e))?;

    config
        .save(format!("{artifact_dir}/training.json"))
        .map_err(|e| anyhow!("Unable to save training config: {}", e))?;

    vocab.save(format!("{artifact_dir}/vocab.json"))?;

    CompactRecorder::new()
        .record(
            model_trained.clone().into_record(),
            format!("{artifact_dir}/model").into(),
        )
        .map_err(|e| anyhow!("Unable to save trained model weights: {}", e))?;

    log::info!("Saved the trained model to {}", artifact_dir);

    let evaluation = evaluate(
        &model_trained.valid(),
        dataloader_valid,
        &config.labels,
        weighting,
    );
    log::info!(
        "Validation classification report: {}",
        evaluation.report.to_json()?
    );

    match evaluation.kappa.compute() {
        Ok(kappa) => log::info!("Validation Cohen's kappa ({}): {:.4}", weighting, kappa),
        Err(e) => log::warn!("Validation Cohen's kappa unavailable: {}", e),
    }

    Ok(model_trained)
}

/// Metrics accumulated over a full pass of the validation split
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Per-class precision, recall and F-score
    pub report: ClassificationReport,

    /// Chance-corrected agreement
    pub kappa: CohenKappa,
}

/// Run the model over every batch without tracking gradients and tally the evaluation metrics
pub fn evaluate<B: Backend>(
    model: &TextCnn<B>,
    dataloader: Arc<dyn DataLoader<Train<B>>>,
    labels: &[String],
    weighting: Weighting,
) -> Evaluation {
    let mut report = ClassificationReport::new(labels.to_vec());
    let mut kappa = CohenKappa::new(weighting);

    for batch in dataloader.iter() {
        let output = model.forward_classification(batch);
        let predictions = output.predictions();
        let targets = output.target_ids();

        report.update(&predictions, &targets);
        kappa.update(&predictions, &targets);
    }

    Evaluation { report, kappa }
}
