use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use partial_sum_schedule::diffusion::Skinny;
use partial_sum_schedule::params::AttackParameters;
use partial_sum_schedule::simulation::SimulationConfig;

#[derive(Parser)]
#[command(name = "partial_sum")]
#[command(about = "Simulate a partial-sum key recovery for a given guess order")]
struct Args {
    /// Path to a JSON file with attack parameters and a guess order
    #[arg(value_name = "FILE")]
    file: String,

    /// Cipher variant (determines the cell width)
    #[arg(long, default_value = "skinny64", require_equals = true)]
    cipher: Cipher,

    /// Print the trace as JSON instead of a plain-text table
    #[arg(long)]
    json: bool,

    /// Also print which subkey cells must be guessed and the maximal number of steps
    #[arg(long)]
    bound: bool,

    /// Override the data bound (in bits)
    #[arg(long, require_equals = true)]
    data_bound: Option<u64>,

    /// Cancel a reduction after this many passes
    #[arg(long, require_equals = true)]
    max_passes: Option<usize>,

    /// Logging verbosity (use -v for info, or -v=LEVEL for specific level)
    #[arg(long, short = 'v', value_name = "LEVEL", num_args = 0..=1, default_missing_value = "info", require_equals = true)]
    verbose: Option<Option<LogLevel>>,
}

#[derive(Clone, clap::ValueEnum)]
enum Cipher {
    #[value(name = "skinny64")]
    Skinny64,
    #[value(name = "skinny128")]
    Skinny128,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
}

impl From<Cipher> for Skinny {
    fn from(value: Cipher) -> Self {
        match value {
            Cipher::Skinny64 => Skinny::n64(),
            Cipher::Skinny128 => Skinny::n128(),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
        }
    }
}

fn main() {
    let args = Args::parse();

    let log_level = match args.verbose {
        None => LevelFilter::Off,
        Some(None) => LevelFilter::Info,
        Some(Some(level)) => level.into(),
    };
    Builder::from_default_env().filter_level(log_level).init();

    let json = std::fs::read_to_string(&args.file).unwrap_or_else(|e| {
        eprintln!("Failed to read parameter file {}: {}", args.file, e);
        std::process::exit(1);
    });
    let parameters: AttackParameters = serde_json::from_str(&json).unwrap_or_else(|e| {
        eprintln!("Invalid parameter file {}: {}", args.file, e);
        std::process::exit(1);
    });

    let cipher: Skinny = args.cipher.into();

    if args.bound {
        match parameters.bound(&cipher) {
            Ok(bound) => {
                let required: Vec<String> = bound.required.iter().map(|it| it.to_string()).collect();
                println!("Required subkeys: {}", required.join(", "));
                for [first, second] in &bound.pairs {
                    println!("Interchangeable: {} / {}", first, second);
                }
                println!("Max steps: {}", bound.max_steps);
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }

    let mut config = SimulationConfig::new();
    config.data_bound = args.data_bound;
    if let Some(max_passes) = args.max_passes {
        config.max_passes = max_passes;
    }

    let trace = parameters
        .start(&cipher, config)
        .and_then(|simulation| simulation.run(&parameters.guess_order))
        .unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        });

    if args.json {
        match serde_json::to_string_pretty(&trace) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("Failed to serialize trace: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!("{}", trace);
    }
}
