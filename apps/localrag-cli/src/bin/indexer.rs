use std::env;
use std::time::Instant;

use localrag_cli::{init_tracing, load_service};
use localrag_hybrid::BuildOptions;
use tracing::info;

/// Rebuild the index with configured settings. Optional args: `[chunk_size] [overlap]`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let service = load_service().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let chunk_size = args.first().map(|s| s.parse::<usize>()).transpose()?;
    let overlap = args.get(1).map(|s| s.parse::<usize>()).transpose()?;

    let settings = service.settings();
    println!("LocalRAG Indexer\n================");
    println!("Data directory: {}", settings.data_dir().display());
    println!("Artifacts:      {}", settings.artifacts_dir().display());
    println!("Embed model:    {}", settings.ollama.embed_model);

    info!(chunk_size = ?chunk_size, overlap = ?overlap, "starting index rebuild");
    let started = Instant::now();
    let stats = service
        .build(BuildOptions { chunk_size, overlap, embed_model: None, show_progress: true })
        .await?;
    info!(docs = stats.docs, chunks = stats.chunks, dim = stats.dim, "indexer finished");
    println!("\n✅ Indexed {} documents into {} chunks (dim {})", stats.docs, stats.chunks, stats.dim);
    println!("⏱️  {} ms", started.elapsed().as_millis());
    println!("\n💡 To search, use: cargo run --bin localrag-vector-search '<query>'");
    Ok(())
}
