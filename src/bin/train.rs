//! Command line tool to train a TextCNN sentiment classifier

use anyhow::anyhow;
use burn::backend::{libtorch::LibTorchDevice, Autodiff, LibTorch};
use pico_args::Arguments;
use textcnn_burn::{
    cli::datasets::Dataset,
    datasets::{imdb, LoadableDataset},
    models::text_cnn::{EmbeddingMode, TextCnnConfig},
    pipelines::text_classification::{self, build_vocab, Weighting},
    vocab::PretrainedEmbeddings,
};

const HELP: &str = "\
Usage: train DATASET [OPTIONS]

Arguments:
  DATASET              The dataset to use (e.g., 'imdb')

Options:
  -h, --help           Print help
  -m, --mode           Embedding mode: 'rand', 'static' or 'nonstatic' (defaults to 'static')
  -e, --embeddings     Path to a GloVe-format vectors file (required for 'static' and 'nonstatic')
  -n, --num-epochs     Number of epochs to train for
  -b, --batch-size     Batch size
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  --max-seq-length     Truncate reviews to this many tokens
  --kappa              Cohen's kappa weighting for the final evaluation: 'none', 'linear' or 'quadratic'
  --cuda               Index of the CUDA device to train on (defaults to the CPU)
  --no-tui             Disable TUI
";

#[derive(Debug)]
struct Args {
    dataset: String,
    mode: Option<String>,
    embeddings: Option<String>,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    data_dir: Option<String>,
    max_seq_length: Option<usize>,
    kappa: Option<String>,
    cuda: Option<usize>,
    use_tui: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            mode: pargs.opt_value_from_str(["-m", "--mode"])?,
            embeddings: pargs.opt_value_from_str(["-e", "--embeddings"])?,
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            max_seq_length: pargs.opt_value_from_str("--max-seq-length")?,
            kappa: pargs.opt_value_from_str("--kappa")?,
            cuda: pargs.opt_value_from_str("--cuda")?,
            use_tui: !(pargs.contains("--no-tui")),
            dataset: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: DATASET"),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let dataset = Dataset::try_from(args.dataset.as_str())?;

    let mode = match &args.mode {
        Some(mode) => EmbeddingMode::try_from(mode.as_str())?,
        None => EmbeddingMode::Static,
    };

    // Reject a bad weighting before any data is loaded
    Weighting::from_name(args.kappa.as_deref())?;

    let mut config = text_classification::Config::new(dataset.labels());

    if let Some(num_epochs) = args.num_epochs {
        config.num_epochs = num_epochs;
    }

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }

    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.to_string();
    }

    config.max_seq_length = args.max_seq_length;
    config.kappa_weighting = args.kappa.clone();

    let device = match args.cuda {
        Some(index) => LibTorchDevice::Cuda(index),
        None => LibTorchDevice::Cpu,
    };

    match dataset {
        Dataset::Imdb => {
            let full = imdb::Dataset::load(&config.data_dir, "train").await?;
            let (train, valid) = full.split(config.train_ratio, config.seed);

            let vocab = build_vocab(&train, &config);
            let model_config = TextCnnConfig::new(vocab.len()).with_mode(mode);

            let embeddings = if mode.requires_pretrained() {
                let path = args.embeddings.as_deref().ok_or_else(|| {
                    anyhow!("The '{}' embedding mode requires --embeddings", mode)
                })?;

                let embeddings =
                    PretrainedEmbeddings::load_glove(path, &vocab, model_config.embedding_dim)
                        .await?;

                Some(embeddings)
            } else {
                None
            };

            text_classification::train::<Autodiff<LibTorch>, imdb::Item, imdb::Dataset>(
                vec![device],
                train,
                valid,
                vocab,
                embeddings,
                model_config,
                config,
                args.use_tui,
            )?;
        }
    }

    Ok(())
}
