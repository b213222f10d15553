//! Command-line driver: train, test, classify with, list and export networks.
//!
//! Run with:
//!   cargo run --release -- train --epochs 10 --save "my perceptron"
//!   cargo run --release -- test "my perceptron"

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use rand::Rng;

use digit_perceptron::dataset::{load_grayscale_input, IMAGE_SIDE};
use digit_perceptron::{
    decode_digit, hit_report, train_loop, Config, Dataset, Error, ModelRecord, ModelStore, Network,
    TrainConfig,
};

#[derive(Parser)]
#[command(name = "digit-perceptron")]
#[command(about = "Multilayer perceptron for handwritten digits, trained by backpropagation")]
struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the four MNIST IDX archives
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory holding saved models and their index
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a fresh network and train it on the training set
    Train {
        /// Learning rate
        #[arg(long)]
        alpha: Option<f64>,
        /// Hidden layer sizes, comma separated (e.g. 10,20,10)
        #[arg(long, value_delimiter = ',')]
        hidden: Option<Vec<usize>>,
        #[arg(long)]
        epochs: Option<usize>,
        /// Seed for weight initialization and shuffling
        #[arg(long)]
        seed: Option<u64>,
        /// Visit training samples in a new random order every epoch
        #[arg(long)]
        shuffle: bool,
        /// Use only the first N samples of each set
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        tolerance: Option<f64>,
        /// Save the trained network under this name
        #[arg(long)]
        save: Option<String>,
    },
    /// Load a saved network and count its hits on both sets
    Test {
        name: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        tolerance: Option<f64>,
    },
    /// Run a saved network on one picture or one test-set sample
    Classify {
        name: String,
        /// PNG, JPEG, BMP or GIF file
        #[arg(long, conflicts_with = "index", required_unless_present = "index")]
        image: Option<PathBuf>,
        /// Index into the test set
        #[arg(long)]
        index: Option<usize>,
        /// Invert the picture (for dark digits on a light background)
        #[arg(long)]
        invert: bool,
    },
    /// List saved networks
    List,
    /// Write a saved network's parameters as JSON
    Export { name: String, out: PathBuf },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_json(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.store_dir {
        config.store_dir = dir;
    }

    match cli.command {
        Command::Train {
            alpha,
            hidden,
            epochs,
            seed,
            shuffle,
            limit,
            tolerance,
            save,
        } => {
            let params = &mut config.hyperparams;
            params.alpha = alpha.unwrap_or(params.alpha);
            if let Some(hidden) = hidden {
                params.hidden_layers = hidden;
            }
            params.epochs = epochs.unwrap_or(params.epochs);
            params.seed = seed.or(params.seed);
            params.shuffle |= shuffle;
            config.limit = limit.or(config.limit);
            config.tolerance = tolerance.unwrap_or(config.tolerance);
            config.validate()?;
            train(&config, save)
        }
        Command::Test {
            name,
            limit,
            tolerance,
        } => {
            config.limit = limit.or(config.limit);
            config.tolerance = tolerance.unwrap_or(config.tolerance);
            config.validate()?;
            test(&config, &name)
        }
        Command::Classify {
            name,
            image,
            index,
            invert,
        } => classify(&config, &name, image, index, invert),
        Command::List => list(&config),
        Command::Export { name, out } => {
            let store = ModelStore::open(&config.store_dir)?;
            let record = store.load(&name)?;
            record.parameters.save_json(&out)?;
            println!("Exported '{}' to {}", name, out.display());
            Ok(())
        }
    }
}

fn train(config: &Config, save: Option<String>) -> anyhow::Result<()> {
    let store = ModelStore::open(&config.store_dir)?;
    if let Some(name) = &save {
        if store.contains(name)? {
            bail!("a network named '{}' already exists; pick another name", name);
        }
    }

    let (training, test) = load_split(config)?;
    let params = &config.hyperparams;
    let seed = params.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!("initializing weights with seed {}", seed);

    let mut network = Network::with_seed(
        config.input_size,
        config.output_size,
        params.alpha,
        &params.hidden_layers,
        seed,
    )?;
    println!(
        "Network {:?}, alpha {}, {} epochs",
        network.layer_sizes(),
        network.alpha(),
        params.epochs
    );

    let mut train_config = TrainConfig::new(params.epochs, config.tolerance);
    if params.shuffle {
        train_config = train_config.with_shuffle(Some(seed));
    }

    let history = train_loop(&mut network, &training, Some(&test), &train_config, |stats| {
        println!(
            "Cycle: {:>4}, Training Data Hits: {:>6}/{}, Test Data Hits: {:>6}/{}  ({} ms)",
            stats.epoch,
            stats.training_hits,
            stats.training_total,
            stats.test_hits.unwrap_or(0),
            stats.test_total.unwrap_or(0),
            stats.elapsed_ms
        );
    })?;

    let Some(name) = save else {
        return Ok(());
    };
    let (training_hits, test_hits) = match history.last() {
        Some(stats) => (stats.training_hits, stats.test_hits.unwrap_or(0)),
        None => {
            let report = hit_report(&mut network, &training, &test, config.tolerance)?;
            (report.training_hits, report.test_hits)
        }
    };

    let record = ModelRecord::new(name.as_str(), &network, test_hits, training_hits);
    match store.save(&record) {
        Ok(()) => {
            println!("Saved '{}'", name);
            Ok(())
        }
        Err(Error::DuplicateName(name)) => {
            bail!("a network named '{}' was saved while training; pick another name", name)
        }
        Err(e) => Err(e.into()),
    }
}

fn test(config: &Config, name: &str) -> anyhow::Result<()> {
    let store = ModelStore::open(&config.store_dir)?;
    let record = store.load(name)?;
    println!(
        "'{}' {:?}, alpha {}; saved with {} training / {} test hits",
        record.name,
        record.parameters.layer_sizes(),
        record.parameters.alpha,
        record.training_hits,
        record.test_hits
    );
    let mut network = record.into_network()?;

    let (training, test) = load_split(config)?;
    let report = hit_report(&mut network, &training, &test, config.tolerance)?;
    println!(
        "Training Data Hits: {}/{}, Test Data Hits: {}/{}",
        report.training_hits,
        training.len(),
        report.test_hits,
        test.len()
    );
    Ok(())
}

fn classify(
    config: &Config,
    name: &str,
    image: Option<PathBuf>,
    index: Option<usize>,
    invert: bool,
) -> anyhow::Result<()> {
    let store = ModelStore::open(&config.store_dir)?;
    let mut network = store.load(name)?.into_network()?;

    let (input, truth) = match (image, index) {
        (Some(path), _) => (load_grayscale_input(&path, IMAGE_SIDE, IMAGE_SIDE, invert)?, None),
        (None, Some(index)) => {
            let test = Dataset::load(config.test_images(), config.test_labels())?;
            let (image, label) = test
                .sample(index)
                .with_context(|| format!("test set has only {} samples", test.len()))?;
            (image.to_vec(), Some(decode_digit(label)))
        }
        (None, None) => bail!("pass either --image or --index"),
    };

    let output = network.classify(&input)?;
    println!("Output: {:?}", output);
    println!("Predicted digit: {}", decode_digit(output[0]));
    if let Some(truth) = truth {
        println!("Labelled digit:  {}", truth);
    }
    Ok(())
}

fn list(config: &Config) -> anyhow::Result<()> {
    let store = ModelStore::open(&config.store_dir)?;
    let names = store.list()?;
    if names.is_empty() {
        println!("No saved networks in {}", store.root().display());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn load_split(config: &Config) -> anyhow::Result<(Dataset, Dataset)> {
    println!("Loading MNIST data from {}...", config.data_dir.display());
    let mut training = Dataset::load(config.train_images(), config.train_labels())
        .context("loading the training set")?;
    let mut test = Dataset::load(config.test_images(), config.test_labels())
        .context("loading the test set")?;
    if let Some(limit) = config.limit {
        training.truncate(limit);
        test.truncate(limit);
    }
    println!(
        "  Training set: {} images, Test set: {} images",
        training.len(),
        test.len()
    );
    Ok((training, test))
}
