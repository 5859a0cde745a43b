use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use trend_topology::config::{embedded_default_json, resolve_config};
use trend_topology::corpus::read_json;
use trend_topology::{ops, PipelineConfig};

#[derive(Parser)]
#[command(
    name = "trends",
    version,
    about = "Fashion trend extraction and cross-source comparison"
)]
struct Cli {
    /// Path to a config JSON file (taxonomy, region map, generic terms).
    /// Defaults to $TRENDS_CONFIG, then the user data dir, then the built-in config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Fail on documents with neither title nor body instead of dropping them
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean titles and bodies of JSON documents read from stdin
    Clean {
        /// Source name for documents that carry none
        #[arg(short, long, default_value = "input")]
        source: String,
    },
    /// Tag relevant documents with taxonomy keywords and a region
    Tag {
        /// Source name for documents that carry none
        #[arg(short, long, default_value = "input")]
        source: String,
        /// Keep irrelevant and malformed documents, flagged `relevant: false`
        #[arg(short, long)]
        all: bool,
    },
    /// Build frequency tables for one source's documents
    Aggregate {
        /// Source name for documents that carry none
        #[arg(short, long, default_value = "input")]
        source: String,
        /// Keep only the first N entries of every table
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },
    /// Compare two keyword lists given as {"a": [...], "b": [...]}
    Compare,
    /// Run the full pipeline over a discussion dump and saved web results
    Report {
        /// Discussion dump ({"<subreddit>": [posts], "scrape_info": {...}})
        #[arg(short, long)]
        discussion: PathBuf,
        /// Saved web-search results
        #[arg(short, long)]
        web: PathBuf,
        /// Keep only the first N entries of every table
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },
    /// Run the full pipeline and print the summarizer prompt
    Prompt {
        #[arg(short, long)]
        discussion: PathBuf,
        #[arg(short, long)]
        web: PathBuf,
    },
    /// Print the built-in config JSON
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trend_topology=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Config = cli.command {
        println!("{}", embedded_default_json());
        return;
    }

    let config = load_config(cli.config.as_deref(), cli.strict);

    let result = match cli.command {
        Commands::Clean { source } => ops::op_clean(&read_stdin_json(), &source).map(print_json),
        Commands::Tag { source, all } => {
            ops::op_tag(&read_stdin_json(), &source, &config, all).map(print_json)
        }
        Commands::Aggregate { source, top } => {
            ops::op_aggregate(&read_stdin_json(), &source, &config, top).map(print_json)
        }
        Commands::Compare => cmd_compare(),
        Commands::Report {
            discussion,
            web,
            top,
        } => {
            let (discussion, web) = read_inputs(&discussion, &web);
            ops::op_report(&discussion, &web, &config, top).map(print_json)
        }
        Commands::Prompt { discussion, web } => {
            let (discussion, web) = read_inputs(&discussion, &web);
            ops::op_prompt(&discussion, &web, &config).map(|p| print!("{p}"))
        }
        Commands::Config => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>, strict: bool) -> PipelineConfig {
    match resolve_config(path) {
        Ok(config) => {
            if strict {
                config.with_strict(true)
            } else {
                config
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn read_stdin() -> Value {
    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("failed to read stdin: {e}");
        std::process::exit(1);
    }
    serde_json::from_str(&buf).unwrap_or_else(|e| {
        eprintln!("invalid JSON on stdin: {e}");
        std::process::exit(1);
    })
}

fn read_stdin_json() -> Vec<Value> {
    match read_stdin() {
        Value::Array(arr) => arr,
        single => vec![single],
    }
}

fn read_inputs(discussion: &Path, web: &Path) -> (Value, Value) {
    let load = |path: &Path| {
        read_json(path).unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        })
    };
    (load(discussion), load(web))
}

fn cmd_compare() -> Result<(), String> {
    let input = read_stdin();
    let side = |key: &str| -> Result<Vec<Value>, String> {
        input
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| format!("expected an array under \"{key}\""))
    };
    let result = ops::op_compare(&side("a")?, &side("b")?)?;
    print_json(result);
    Ok(())
}

fn print_json(value: Value) {
    match serde_json::to_string_pretty(&value) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("failed to render output: {e}");
            std::process::exit(1);
        }
    }
}
