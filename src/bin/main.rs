//! rfsvm Command Line Interface
//!
//! Runs random-feature SVM experiments over a directory of per-patient
//! sample files and inspects the saved models.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info, warn};
use rfsvm::config::ExperimentConfig;
use rfsvm::core::{RFError, Result};
use rfsvm::data::PatientStore;
use rfsvm::experiment::run_experiment;
use rfsvm::features::FeatureType;
use rfsvm::kernel::KernelType;
use rfsvm::persistence::SavedModel;
use rfsvm::task::Task;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "rfsvm")]
#[command(about = "Random-feature linear SVM experiments on patient-split data")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full experiment: features, datasets, training, evaluation
    Run(RunArgs),
    /// Display saved model information
    Info(InfoArgs),
    /// List the patients found in a data directory
    Patients(PatientsArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory of per-patient files (overrides the config)
    #[arg(long)]
    data: Option<PathBuf>,

    /// JSON experiment config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the trained model to this file
    #[arg(long)]
    save_model: Option<PathBuf>,

    /// Feature type code: F (Fourier) or B (binning)
    #[arg(long)]
    feature_type: Option<char>,

    /// Kernel code for Fourier features: G (Gaussian) or L (Laplacian)
    #[arg(long)]
    kernel: Option<char>,

    /// Number of random features
    #[arg(long)]
    fdim: Option<usize>,

    /// Raw input dimension
    #[arg(long)]
    idim: Option<usize>,

    /// Kernel bandwidth (default sqrt(idim))
    #[arg(long)]
    bandwidth: Option<f64>,

    /// Feature sampling seed
    #[arg(long)]
    feature_seed: Option<u64>,

    /// Train on raw vectors without a feature map
    #[arg(long)]
    raw: bool,

    /// Training patients: first N, or all but the last |N| when negative
    #[arg(long, allow_hyphen_values = true)]
    ntrain: Option<isize>,

    /// Test patients: last N, or all but the first |N| when negative
    #[arg(long, allow_hyphen_values = true)]
    ntest: Option<isize>,

    /// Fraction of training samples kept
    #[arg(long)]
    ptrain: Option<f64>,

    /// Fraction of test samples kept
    #[arg(long)]
    ptest: Option<f64>,

    /// Subsampling seed
    #[arg(long)]
    seed: Option<u64>,

    /// Built-in transform generator: identity, dihedral or jitter
    #[arg(long)]
    transform: Option<String>,

    /// Transform argument as KEY=VALUE (repeatable)
    #[arg(long = "targ", value_parser = parse_targ)]
    targs: Vec<(String, f64)>,

    /// Regularization parameter C
    #[arg(short = 'C', long)]
    c: Option<f64>,

    /// Convergence tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Maximum solver passes
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Worker threads
    #[arg(long)]
    cores: Option<usize>,

    /// Raw samples used to check the kernel approximation
    #[arg(long)]
    diagnostic_samples: Option<usize>,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

#[derive(Args)]
struct PatientsArgs {
    /// Data directory
    dir: PathBuf,

    /// Also count each patient's samples
    #[arg(long)]
    count: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::Info(args) => info_command(args),
        Commands::Patients(args) => patients_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn parse_targ(raw: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let value = value
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{value}' for '{key}'"))?;
    Ok((key.to_string(), value))
}

/// Load the config file (if any) and apply command line overrides
fn build_config(args: &RunArgs) -> Result<ExperimentConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from: {path:?}");
            ExperimentConfig::from_file(path)?
        }
        None => ExperimentConfig::default(),
    };

    if let Some(data) = &args.data {
        config.data_dir = Some(data.clone());
    }

    let feature = &mut config.feature;
    if let Some(code) = args.feature_type {
        feature.feature_type = FeatureType::from_code(code)?;
    }
    if let Some(code) = args.kernel {
        if feature.feature_type == FeatureType::Binning {
            warn!("Binning features always approximate the Laplacian kernel; ignoring --kernel");
        } else {
            feature.kernel = KernelType::from_code(code)?;
        }
    }
    if args.raw {
        feature.enabled = false;
    }
    feature.fdim = args.fdim.unwrap_or(feature.fdim);
    feature.idim = args.idim.unwrap_or(feature.idim);
    feature.bandwidth = args.bandwidth.or(feature.bandwidth);
    feature.seed = args.feature_seed.or(feature.seed);

    let dataset = &mut config.dataset;
    dataset.ntrain = args.ntrain.unwrap_or(dataset.ntrain);
    dataset.ntest = args.ntest.unwrap_or(dataset.ntest);
    dataset.ptrain = args.ptrain.unwrap_or(dataset.ptrain);
    dataset.ptest = args.ptest.unwrap_or(dataset.ptest);
    dataset.seed = args.seed.unwrap_or(dataset.seed);
    if args.transform.is_some() {
        dataset.transform = args.transform.clone();
    }
    dataset.targs.extend(args.targs.iter().cloned());

    let svc = &mut config.svc;
    svc.c = args.c.unwrap_or(svc.c);
    svc.tolerance = args.tolerance.unwrap_or(svc.tolerance);
    svc.max_iterations = args.max_iterations.unwrap_or(svc.max_iterations);

    config.cores = args.cores.or(config.cores);
    config.diagnostic_samples = args.diagnostic_samples.unwrap_or(config.diagnostic_samples);

    Ok(config)
}

fn run_command(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    let data_dir = config.data_dir.clone().ok_or_else(|| {
        RFError::InvalidParameter("no data directory: pass --data or set data_dir".to_string())
    })?;

    info!("Running experiment on patients in {data_dir:?}");
    let main = Task::root("experiment");
    let outcome = run_experiment(&config, &PatientStore::new(&data_dir), &main)?;
    main.done("Experiment finished");

    println!("=== Experiment Results ===");
    match &outcome.package {
        Some(package) => println!(
            "Features: {} ({} -> {} dims, bandwidth {:.4})",
            package.feature_type(),
            package.idim(),
            package.fdim(),
            package.bandwidth()
        ),
        None => println!("Features: raw"),
    }
    if let Some(error) = &outcome.approximation {
        println!(
            "Kernel approximation: mean |error| {:.4}, max {:.4} over {} pairs",
            error.mean_abs, error.max_abs, error.pairs
        );
    }
    println!("Solver passes: {}", outcome.model.iterations());
    println!("{}", outcome.train_report);
    println!("{}", outcome.report);

    if let Some(path) = &args.save_model {
        let saved = SavedModel::from_trained_model(&outcome.model, outcome.package, &config.svc);
        saved.save_to_file(path)?;
        info!("Model saved to: {path:?}");
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let saved = SavedModel::load_from_file(&args.model)?;
    let model = saved.to_trained_model()?;

    println!("=== Model Information ===");
    println!("Library version: {}", saved.metadata.library_version);
    println!("Created at: {}", saved.created_at()?);
    println!("Classes: {:?}", saved.classes);
    println!("Separators: {}", saved.weights.len());
    println!("Input features: {}", saved.metadata.n_features);
    println!("Solver passes: {}", saved.metadata.iterations);
    let params = &saved.metadata.training_params;
    println!(
        "Training parameters: C={}, tol={}, max_iter={}, intercept={}",
        params.c, params.tolerance, params.max_iterations, params.fit_intercept
    );
    match &saved.feature {
        Some(package) => println!("Feature package: {}", package.to_json()?),
        None => println!("Feature package: none (raw inputs)"),
    }
    for (i, bias) in model.biases().iter().enumerate() {
        println!("  bias[{i}]: {bias:.6}");
    }

    Ok(())
}

fn patients_command(args: PatientsArgs) -> Result<()> {
    let store = PatientStore::new(&args.dir);
    let patients = store.discover()?;

    println!("{} patients in {:?}", patients.len(), args.dir);
    for id in &patients {
        if args.count {
            println!("{id}\t{}", store.load(id)?.len());
        } else {
            println!("{id}");
        }
    }

    Ok(())
}
