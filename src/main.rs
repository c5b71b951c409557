//! 命令行程序入口
//!
//! Runs one full rewrite pass over an HTML document and writes the result.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wordswap::env::{self, EnvVar};
use wordswap::parsers::{html_to_dom, serialize_document};
use wordswap::rewrite::settings::migrate_legacy_settings;
use wordswap::rewrite::{
    ConfigManager, EngineOptions, LiveDocument, MemoryStore, RewriteEngine, RewriteResult,
};

#[derive(Parser)]
#[command(
    name = "wordswap",
    version,
    about = "Replace configured words in an HTML document, preserving their case"
)]
struct Cli {
    /// HTML document to rewrite; reads stdin when omitted or "-".
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Settings as a JSON object (`enabled`, `replacementGroups` or the legacy keys).
    #[arg(short = 'c', long = "settings", value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Engine options file (TOML or JSON); searched in the default locations when omitted.
    #[arg(long = "options", value_name = "FILE")]
    options: Option<PathBuf>,

    /// Write the document here instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Character encoding of the input and output.
    #[arg(short = 'E', long = "encoding", default_value = "utf-8")]
    encoding: String,

    /// Do not print the pass summary.
    #[arg(short = 's', long = "silent")]
    silent: bool,

    /// List the environment variables the engine reads, then exit.
    #[arg(long = "list-env")]
    list_env: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    if cli.list_env {
        print!("{}", env::generate_env_docs());
        return;
    }

    if let Err(error) = run(cli).await {
        eprintln!("Error: {}", error);
        process::exit(1);
    }
}

fn init_logging() {
    let level = env::core::LogLevel::get_or_default("warn".to_string());
    let filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> RewriteResult<()> {
    let options = load_options(&cli)?;
    let input = read_input(cli.input.as_ref())?;

    let store = match &cli.settings {
        Some(path) => MemoryStore::from_json(&fs::read_to_string(path)?)?,
        None => MemoryStore::new(),
    };
    migrate_legacy_settings(&store, &options.fallback_replacement).await?;

    let document = LiveDocument::new(html_to_dom(&input, &cli.encoding));
    let mut engine = RewriteEngine::new(store, document.clone(), options);
    engine.start().await;
    engine.stop();

    let result = serialize_document(document.root(), &cli.encoding)?;
    match &cli.output {
        Some(path) => fs::write(path, &result)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&result)?;
            stdout.flush()?;
        }
    }

    if !cli.silent {
        let stats = engine.last_pass();
        eprintln!(
            "{} text nodes scanned, {} rewritten, {} errors",
            stats.nodes_visited, stats.nodes_rewritten, stats.errors
        );
    }

    Ok(())
}

fn load_options(cli: &Cli) -> RewriteResult<EngineOptions> {
    let manager = match &cli.options {
        Some(path) => ConfigManager::from_file(&path.to_string_lossy())?,
        None => ConfigManager::new()?,
    };
    Ok(manager.into_options())
}

fn read_input(path: Option<&PathBuf>) -> RewriteResult<Vec<u8>> {
    match path {
        Some(path) if path.as_os_str() != "-" => Ok(fs::read(path)?),
        _ => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}
