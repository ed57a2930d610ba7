use std::env;

use localrag_cli::{init_tracing, load_service};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [--limit N]", args[0]);
        eprintln!("Example: {} 'storing seed potatoes' --limit 5", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let service = load_service()?;
    let mut limit = service.settings().query.top_k;
    let mut i = 2;
    while i < args.len() {
        if args[i] == "--limit" {
            match args.get(i + 1).and_then(|s| s.parse::<usize>().ok()) {
                Some(l) => {
                    limit = l;
                    i += 1;
                }
                None => {
                    eprintln!("Error: --limit requires a number");
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    println!("🔍 localrag-vector-search\n========================");
    println!("Query: {query_text}");
    let results = service.search(query_text, limit).await?;
    debug!(limit, hits = results.len(), "search finished");
    println!("\n🔍 Found {} results for: \"{}\"", results.len(), query_text);
    for hit in &results {
        println!(
            "\n  {}. score={:.4}  source={}  chunk={}",
            hit.rank, hit.score, hit.chunk.source, hit.chunk.chunk_id
        );
        let preview: String = hit.chunk.text.chars().take(300).collect();
        println!("     📝 Content: {preview}");
    }
    Ok(())
}
