use localrag_core::config::Config;
use localrag_vector::{meta_len, IndexPaths, VectorStore};

fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let dir = settings.artifacts_dir();
    let paths = IndexPaths::new(&dir);
    println!("artifacts: {}", dir.display());
    println!(
        "generation={} vectors.bin present={} meta.json entries={}",
        paths.generation.as_deref().unwrap_or("-"),
        paths.vectors.is_file(),
        meta_len(&dir)
    );

    match VectorStore::load(&dir) {
        Ok(store) => println!(
            "index: entries={} dim={} model={}",
            store.len(),
            store.dim(),
            store.embed_model().unwrap_or("-")
        ),
        Err(e) => println!("index: {e}"),
    }
    Ok(())
}
