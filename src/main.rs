use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use lexrag_core::bootstrap::{
    OfflineProvider, build_pipeline, build_provider, load_config, resolve_config_path,
};
use lexrag_core::config::Config;
use lexrag_core::vault::EnvVaultProvider;
use lexrag_rag::ScoredChunk;
use lexrag_rag::document::token_count;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "lexrag", version)]
#[command(about = "Answer questions from a directory of documents using lexical retrieval")]
struct Cli {
    /// Config file (defaults to $LEXRAG_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of chunks handed to the model
    #[arg(long, global = true)]
    top_n: Option<usize>,

    /// Upper bound on chunk length in characters
    #[arg(long, global = true)]
    max_chunk_size: Option<usize>,

    /// Also print the chunks an answer was grounded on
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a question and print the model's answer
    Ask {
        query: String,
        /// Directory holding the documents
        #[arg(long)]
        dir: PathBuf,
    },
    /// Rank chunks against a query without calling the model
    Search {
        query: String,
        #[arg(long)]
        dir: PathBuf,
        /// Show every chunk instead of the top N
        #[arg(long)]
        all: bool,
    },
    /// Show how a directory is chunked
    Chunks {
        #[arg(long)]
        dir: PathBuf,
    },
    /// Write the default configuration as TOML
    Init {
        /// Output path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();
    let cli = Cli::parse();

    if let Command::Init { output } = &cli.command {
        return write_default_config(output.as_deref());
    }

    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = load_config(&config_path, &EnvVaultProvider).await?;
    if let Some(n) = cli.top_n {
        config.rag.top_n = n;
    }
    if let Some(size) = cli.max_chunk_size {
        config.rag.max_chunk_size = size;
    }
    config.validate()?;

    match cli.command {
        Command::Ask { query, dir } => ask(&config, &query, &dir, cli.verbose).await,
        Command::Search { query, dir, all } => {
            if all {
                config.rag.top_n = usize::MAX;
            }
            search(&config, &query, &dir).await
        }
        Command::Chunks { dir } => chunks(&config, &dir).await,
        Command::Init { .. } => Ok(()),
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn ask(config: &Config, query: &str, dir: &Path, verbose: bool) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config, build_provider(config)?)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let result = pipeline.answer(query, dir, &cancel).await?;
    tracing::info!(sources = result.sources.len(), "answer received");

    println!("{}", result.answer);
    if verbose {
        println!();
        println!("Sources:");
        print_ranked(&result.sources);
    }
    Ok(())
}

async fn search(config: &Config, query: &str, dir: &Path) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config, OfflineProvider)?;
    let hits = pipeline.search(query, dir).await?;
    if hits.is_empty() {
        println!("no chunks found in {}", dir.display());
    }
    print_ranked(&hits);
    Ok(())
}

async fn chunks(config: &Config, dir: &Path) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config, OfflineProvider)?;
    let chunks = pipeline.chunks(dir).await?;

    let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    let mut per_source: BTreeMap<&str, usize> = BTreeMap::new();
    for chunk in &chunks {
        *per_source.entry(chunk.metadata.source.as_str()).or_default() += 1;
    }

    println!("chunks: {}", chunks.len());
    println!("tokens: {}", token_count(&contents));
    for (source, count) in per_source {
        println!("  {count:>5}  {source}");
    }
    Ok(())
}

fn print_ranked(hits: &[ScoredChunk]) {
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>3}. [{:.3}] {}#{}",
            rank + 1,
            hit.score,
            hit.chunk.metadata.source,
            hit.chunk.chunk_index
        );
        println!("     {}", hit.chunk.content.trim());
    }
}

fn write_default_config(output: Option<&Path>) -> anyhow::Result<()> {
    let toml = toml::to_string_pretty(&Config::default())
        .context("failed to serialize default config")?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, toml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "default config written");
        }
        None => print!("{toml}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_ask_with_globals() {
        let cli = Cli::try_parse_from([
            "lexrag",
            "ask",
            "what is it?",
            "--dir",
            "docs",
            "--top-n",
            "5",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.top_n, Some(5));
        assert!(cli.verbose);
        match cli.command {
            Command::Ask { query, dir } => {
                assert_eq!(query, "what is it?");
                assert_eq!(dir, PathBuf::from("docs"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_requires_dir_for_search() {
        assert!(Cli::try_parse_from(["lexrag", "search", "fox"]).is_err());
        let cli = Cli::try_parse_from(["lexrag", "search", "fox", "--dir", ".", "--all"]).unwrap();
        assert!(matches!(cli.command, Command::Search { all: true, .. }));
    }

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lexrag.toml");
        write_default_config(Some(&path)).unwrap();

        let loaded: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.llm.model, Config::default().llm.model);
        assert_eq!(loaded.rag.extensions, vec!["pdf"]);
        assert_eq!(loaded.timeouts.completion, 60);
    }
}
