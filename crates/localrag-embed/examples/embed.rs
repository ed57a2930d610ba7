use localrag_core::config::Config;
use localrag_embed::{get_default_embedder, l2_norm};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = get_default_embedder(&settings.ollama)?;
    for text in ["hello world", "rust embeddings"] {
        let v = embedder.embed(embedder.default_model(), text).await?;
        println!("{text:?}: dim={} norm={:.4}", v.len(), l2_norm(&v));
    }
    Ok(())
}
