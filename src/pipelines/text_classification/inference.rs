use std::sync::Arc;

use burn::{
    config::Config as _,
    data::dataloader::batcher::Batcher as BatcherTrait,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::{backend::Backend, Tensor},
};

use crate::{models::text_cnn::TextCnnConfig, vocab::Vocabulary};

use super::{batcher::Infer, Batcher, Config};

/// Define inference function
pub fn infer<B: Backend>(
    device: B::Device,     // Device on which to perform computation (e.g., CPU or CUDA device)
    artifact_dir: &str,    // Directory containing model, vocabulary and config files
    samples: Vec<String>,  // Review texts for inference
) -> anyhow::Result<(Tensor<B, 2>, Config)> {
    // Load experiment configuration
    let model_config = TextCnnConfig::load(format!("{artifact_dir}/config.json").as_str())
        .map_err(|e| anyhow!("Unable to load model config file: {}", e))?;

    let config = Config::load(format!("{artifact_dir}/training.json").as_str())
        .map_err(|e| anyhow!("Unable to load training config file: {}", e))?;

    let vocab = Vocabulary::load(format!("{artifact_dir}/vocab.json"))?;

    // Initialize batcher for batching samples
    let batcher = Batcher::<B>::new(
        Arc::new(vocab),
        &config.labels,
        model_config.min_seq_length(),
        config.max_seq_length,
        device.clone(),
    );

    // Load pre-trained model weights
    log::info!("Loading weights from {}...", artifact_dir);

    let record = CompactRecorder::new()
        .load(format!("{artifact_dir}/model").into(), &device)
        .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

    // Create model using loaded weights
    let model = model_config
        .init_for_record::<B>(&device)?
        .load_record(record);

    // Run inference on the given text samples
    log::info!("Running inference on {} samples...", samples.len());

    let item: Infer<B> = batcher.batch(samples);

    Ok((model.infer(item), config))
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use crate::{datasets::imdb, models::text_cnn::EmbeddingMode, utils::files::ensure_dir};

    use super::*;

    type TestBackend = NdArray;

    #[tokio::test]
    async fn test_infer_from_saved_artifacts() {
        let device = Default::default();
        let artifact_dir = std::env::temp_dir()
            .join(format!("textcnn-infer-{}", std::process::id()))
            .to_string_lossy()
            .to_string();
        ensure_dir(&artifact_dir).await.expect("artifact dir");

        let documents = ["a great film", "a bad film"]
            .iter()
            .map(|review| review.split(' ').map(String::from).collect::<Vec<_>>());
        let vocab = Vocabulary::build(documents, None, 1);
        let model_config = TextCnnConfig::new(vocab.len())
            .with_embedding_dim(4)
            .with_num_filters(2)
            .with_mode(EmbeddingMode::Random);
        let config = Config::new(imdb::Dataset::labels());
        let model = model_config
            .init::<TestBackend>(None, &device)
            .expect("valid config");

        model_config
            .save(format!("{artifact_dir}/config.json"))
            .expect("model config saved");
        config
            .save(format!("{artifact_dir}/training.json"))
            .expect("training config saved");
        vocab
            .save(format!("{artifact_dir}/vocab.json"))
            .expect("vocab saved");
        CompactRecorder::new()
            .record(
                model.into_record(),
                format!("{artifact_dir}/model").into(),
            )
            .expect("model saved");

        let (probabilities, loaded) = infer::<TestBackend>(
            device,
            &artifact_dir,
            vec!["A great film!".to_string(), "bad".to_string()],
        )
        .expect("inference");

        assert_eq!(probabilities.dims(), [2, 1]);
        assert_eq!(loaded.labels, imdb::Dataset::labels());

        let values = probabilities.into_data().convert::<f32>().value;
        assert!(values.iter().all(|p| *p > 0.0 && *p < 1.0));

        std::fs::remove_dir_all(&artifact_dir).ok();
    }
}
