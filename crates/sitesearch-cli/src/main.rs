//! sitesearch CLI - index a mirrored website and search it.
//!
//! # Usage
//!
//! ```bash
//! # Build the index from an HTTrack mirror
//! sitesearch index ./website
//!
//! # Search it
//! sitesearch search "tuition fees"
//! sitesearch search "library OR books" -a custom -n 5
//! sitesearch search "title:admissions" --json
//!
//! # Most authoritative pages, and an interactive session
//! sitesearch pagerank -n 20
//! sitesearch repl -a pl2
//! ```

mod config;
mod index;
mod output;
mod pagerank;
mod repl;
mod search;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sitesearch_core::RankingAlgorithm;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Website search engine with PageRank and lexical ranking.
#[derive(Debug, Parser)]
#[command(name = "sitesearch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Index directory (default: $SITESEARCH_INDEX_DIR, then the config file,
    /// then the platform data directory)
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Configuration file (default: sitesearch.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse html files of a website mirror and create the index
    Index {
        /// Directory containing the mirrored website files
        website_dir: PathBuf,

        /// Reuse documents parsed by an earlier cached run of this directory
        #[arg(long)]
        use_cache: bool,
    },
    /// Search the index
    Search {
        /// Search query
        query: String,

        /// Ranking algorithm
        #[arg(short, long, default_value = "bm25", value_parser = parse_algorithm)]
        algorithm: RankingAlgorithm,

        /// Maximum number of results to return
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List indexed documents by pagerank, highest first
    Pagerank {
        /// Maximum number of documents to list
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Search interactively, paging through results
    Repl {
        /// Ranking algorithm
        #[arg(short, long, default_value = "bm25", value_parser = parse_algorithm)]
        algorithm: RankingAlgorithm,
    },
}

fn parse_algorithm(value: &str) -> Result<RankingAlgorithm, String> {
    value.parse().map_err(|e: sitesearch_core::SearchError| e.to_string())
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("debug")
        } else if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let file_config = config::load_config(cli.config.as_deref())?;
    let index_dir = config::index_dir(cli.index_dir.as_ref(), &file_config)?;
    let engine_config = file_config.engine();

    match &cli.command {
        Command::Index {
            website_dir,
            use_cache,
        } => {
            let report =
                index::execute_index(website_dir, &index_dir, engine_config, *use_cache)?;
            println!("{}", output::format_report(&report));
        }
        Command::Search {
            query,
            algorithm,
            limit,
            json,
        } => {
            let outcome =
                search::execute_search(query, *limit, *algorithm, &index_dir, engine_config.search)?;
            let output = if *json {
                output::format_json(query, *algorithm, &outcome)
            } else {
                output::format_human(&outcome)
            };
            println!("{}", output);
        }
        Command::Pagerank { limit } => {
            let hits = pagerank::execute_pagerank(&index_dir, *limit)?;
            println!("{}", output::format_pagerank(&hits));
        }
        Command::Repl { algorithm } => {
            let engine = search::open_engine(&index_dir, engine_config.search)?;
            let stdin = std::io::stdin();
            repl::run_repl(&engine, *algorithm, stdin.lock(), std::io::stdout())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_defaults() {
        let cli = Cli::try_parse_from(["sitesearch", "search", "fees"]).unwrap();
        match cli.command {
            Command::Search {
                query,
                algorithm,
                limit,
                json,
            } => {
                assert_eq!(query, "fees");
                assert_eq!(algorithm, RankingAlgorithm::Bm25);
                assert_eq!(limit, 10);
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sitesearch",
            "search",
            "fees",
            "-a",
            "PageRank",
            "--index-dir",
            "/tmp/index",
            "--debug",
        ])
        .unwrap();
        assert_eq!(cli.index_dir, Some(PathBuf::from("/tmp/index")));
        assert!(cli.debug);
        assert!(matches!(
            cli.command,
            Command::Search {
                algorithm: RankingAlgorithm::PageRank,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_algorithm_lists_choices() {
        let err = Cli::try_parse_from(["sitesearch", "search", "fees", "-a", "vector"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Invalid ranking algorithm: vector"));
        assert!(message.contains("tf_idf"));
    }

    #[test]
    fn test_index_requires_website_dir() {
        assert!(Cli::try_parse_from(["sitesearch", "index"]).is_err());
    }

    #[test]
    fn test_index_cache_flag() {
        let cli = Cli::try_parse_from(["sitesearch", "index", "./site", "--use-cache"]).unwrap();
        assert!(matches!(cli.command, Command::Index { use_cache: true, .. }));
        let cli = Cli::try_parse_from(["sitesearch", "index", "./site"]).unwrap();
        assert!(matches!(cli.command, Command::Index { use_cache: false, .. }));
    }

    #[test]
    fn test_pagerank_and_repl_commands() {
        let cli = Cli::try_parse_from(["sitesearch", "pagerank", "-n", "5"]).unwrap();
        assert!(matches!(cli.command, Command::Pagerank { limit: 5 }));

        let cli = Cli::try_parse_from(["sitesearch", "repl", "-a", "pl2"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Repl {
                algorithm: RankingAlgorithm::Pl2
            }
        ));
    }
}
