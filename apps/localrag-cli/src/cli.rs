use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use localrag_hybrid::{BuildOptions, RagService};
use localrag_vector::build_context;

/// Local retrieval-augmented QA over a folder of documents.
#[derive(Parser, Debug)]
#[command(name = "localrag")]
#[command(version)]
#[command(about = "Build a local vector index and answer questions from it", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the index from the data directory
    Build(BuildArgs),

    /// Hybrid answer: customer lookup plus retrieved context
    Query(AskArgs),

    /// Grounded answer next to the bare model's answer
    Compare(AskArgs),

    /// Print the retrieved context block without calling the LLM
    Search(AskArgs),

    /// Index and model status
    Status,

    /// List files in the data directory
    List,

    /// Copy supported files into the data directory
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete all data and index artifacts
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[arg(long)]
    pub chunk_size: Option<usize>,

    #[arg(long)]
    pub overlap: Option<usize>,

    #[arg(long)]
    pub embed_model: Option<String>,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    pub question: String,

    /// Number of chunks to retrieve (defaults to query.top_k)
    #[arg(long, short = 'k')]
    pub top_k: Option<usize>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(cli: Cli, service: &RagService) -> Result<()> {
    match cli.command {
        Commands::Build(args) => build(service, args).await,
        Commands::Query(args) => {
            let top_k = top_k(service, &args)?;
            let state = service.query(&args.question, top_k).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("{}", state.final_answer);
            }
            Ok(())
        }
        Commands::Compare(args) => {
            let top_k = top_k(service, &args)?;
            let cmp = service.compare(&args.question, top_k).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&cmp)?);
                return Ok(());
            }
            println!("== RAG ==\n{}\n", cmp.rag.answer);
            println!("== LLM only ==\n{}\n", cmp.llm.answer);
            println!("Model: {} | Embed: {} | Top-K: {}", cmp.used.model, cmp.used.embed, cmp.used.top_k);
            println!(
                "retrieve: {}ms  rag: {}ms  llm: {}ms",
                cmp.latency_ms.retrieve, cmp.latency_ms.rag, cmp.latency_ms.llm
            );
            Ok(())
        }
        Commands::Search(args) => {
            let top_k = top_k(service, &args)?;
            let hits = service.search(&args.question, top_k).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                println!("{}", build_context(&hits));
            }
            Ok(())
        }
        Commands::Status => {
            println!("{}", serde_json::to_string_pretty(&service.status())?);
            Ok(())
        }
        Commands::List => {
            let files = service.list_files();
            for f in &files {
                println!("{:>10}  {}", f.bytes, f.path);
            }
            println!("{} file(s)", files.len());
            Ok(())
        }
        Commands::Ingest { files } => {
            for f in service.ingest(&files)? {
                println!("saved {} ({} bytes)", f.path, f.bytes);
            }
            Ok(())
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("refusing to delete data and artifacts without --yes");
            }
            service.clear()?;
            println!("cleared");
            Ok(())
        }
    }
}

async fn build(service: &RagService, args: BuildArgs) -> Result<()> {
    let started = Instant::now();
    let opts = BuildOptions {
        chunk_size: args.chunk_size,
        overlap: args.overlap,
        embed_model: args.embed_model,
        show_progress: !args.quiet,
    };
    let stats = service.build(opts).await?;
    println!(
        "docs={} chunks={} dim={} ms={}",
        stats.docs,
        stats.chunks,
        stats.dim,
        started.elapsed().as_millis()
    );
    Ok(())
}

fn top_k(service: &RagService, args: &AskArgs) -> Result<usize> {
    let k = args.top_k.unwrap_or(service.settings().query.top_k);
    if k == 0 {
        bail!("--top-k must be at least 1");
    }
    Ok(k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_with_top_k() {
        let cli = Cli::try_parse_from(["localrag", "query", "Where is my order?", "-k", "3", "--json"]).unwrap();
        match cli.command {
            Commands::Query(a) => {
                assert_eq!(a.question, "Where is my order?");
                assert_eq!(a.top_k, Some(3));
                assert!(a.json);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_build_overrides() {
        let cli = Cli::try_parse_from(["localrag", "build", "--chunk-size", "800", "--overlap", "100"]).unwrap();
        match cli.command {
            Commands::Build(a) => {
                assert_eq!((a.chunk_size, a.overlap), (Some(800), Some(100)));
                assert!(a.embed_model.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ingest_requires_files() {
        assert!(Cli::try_parse_from(["localrag", "ingest"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
