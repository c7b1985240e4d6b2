//! Command line tool for scoring movie reviews with a trained TextCNN

use anyhow::Result;
use burn::backend::{libtorch::LibTorchDevice, LibTorch};
use pico_args::Arguments;
use textcnn_burn::{
    datasets::imdb,
    pipelines::text_classification::{self, infer, output::predicted_classes},
};

const HELP: &str = "\
Usage: infer [OPTIONS]

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -n, --num-samples    Number of test reviews to score (defaults to 10)
  --cuda               Index of the CUDA device to run on (defaults to the CPU)
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// The top-level data directory
    data_dir: Option<String>,

    /// How many reviews to sample
    num_samples: Option<usize>,

    /// CUDA device index
    cuda: Option<usize>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = Arguments::from_env();

    let args = Args {
        help: pargs.contains(["-h", "--help"]),
        data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
        num_samples: pargs.opt_value_from_str(["-n", "--num-samples"])?,
        cuda: pargs.opt_value_from_str("--cuda")?,
    };

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = parse_args()?;

    if args.help {
        println!("{}", HELP);
        return Ok(());
    }

    let data_dir = args.data_dir.unwrap_or_else(|| "data".to_string());
    let artifact_dir = text_classification::Config::new(imdb::Dataset::labels())
        .with_data_dir(data_dir.clone())
        .artifact_dir();

    let device = match args.cuda {
        Some(index) => LibTorchDevice::Cuda(index),
        None => LibTorchDevice::Cpu,
    };

    let num_samples = args.num_samples.unwrap_or(10);
    let samples = imdb::Dataset::get_samples(&data_dir, "test", num_samples).await?;

    let input: Vec<String> = samples.iter().map(|(review, _)| review.clone()).collect();

    // Get model predictions
    let (predictions, config) = infer::<LibTorch>(device, &artifact_dir, input)?;

    let probabilities = predictions.clone().into_data().convert::<f32>().value;
    let [_, n_classes] = predictions.dims();
    let classes = predicted_classes(predictions);

    // Print out predictions for each sample
    for (i, (text, expected)) in samples.into_iter().enumerate() {
        let class = config
            .labels
            .get(classes[i])
            .map(String::as_str)
            .unwrap_or("unknown");
        let scores = &probabilities[i * n_classes..(i + 1) * n_classes];

        // Print sample text and predicted class name
        println!(
            "\n=== Item {i} ===\
             \n- Text: {text}\
             \n- Class: {class} {scores:?}\
             \n- Expected: {expected}\
             \n================"
        );
    }

    Ok(())
}
