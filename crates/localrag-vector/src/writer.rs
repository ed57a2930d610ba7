use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use localrag_core::error::{Error, Result};
use localrag_core::types::Chunk;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::schema::{
    is_generation_name, read_pointer, IndexPaths, DIGEST_LEN, FORMAT_VERSION, GENERATION_PREFIX, MAGIC, POINTER_FILE,
};
use crate::store::VectorStore;

/// Extra attempts a load makes when a rebuild moves `CURRENT` underneath it.
const LOAD_RETRIES: usize = 3;

impl VectorStore {
    /// Write a new generation into `dir` and commit it by swapping `CURRENT`.
    ///
    /// Both artifacts are written to temp files and renamed into the
    /// generation directory before the pointer moves. If anything fails
    /// before the swap, the previous generation stays committed.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let meta = serde_json::to_vec_pretty(self.chunks())
            .map_err(|e| Error::CorruptIndex(format!("failed to serialize metadata: {e}")))?;
        let vectors = self.encode_vectors(&meta)?;
        let hash = blake3::hash(&vectors).to_hex();
        let name = format!("{GENERATION_PREFIX}{}", &hash.as_str()[..16]);

        let staged = IndexPaths::in_generation(dir, &name);
        let gen_dir = dir.join(&name);
        fs::create_dir_all(&gen_dir).map_err(|e| Error::io(&gen_dir, e))?;
        write_atomic(&gen_dir, &staged.meta, |w| w.write_all(&meta))?;
        write_atomic(&gen_dir, &staged.vectors, |w| w.write_all(&vectors))?;

        let previous = read_pointer(dir);
        write_atomic(dir, &dir.join(POINTER_FILE), |w| w.write_all(name.as_bytes()))?;
        prune_generations(dir, &name, previous.as_deref());

        info!(dir = %dir.display(), generation = %name, entries = self.len(), dim = self.dim(), "persisted index");
        Ok(())
    }

    fn encode_vectors(&self, meta: &[u8]) -> Result<Vec<u8>> {
        let payload: Vec<u8> = self.raw_vectors().iter().flat_map(|x| x.to_le_bytes()).collect();
        let model = self.embed_model().unwrap_or_default().as_bytes();

        let mut out = Vec::with_capacity(payload.len() + model.len() + 2 * DIGEST_LEN + 28);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&to_u32(self.dim())?.to_le_bytes());
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());
        out.extend_from_slice(&to_u32(model.len())?.to_le_bytes());
        out.extend_from_slice(model);
        out.extend_from_slice(blake3::hash(meta).as_bytes());
        out.extend_from_slice(blake3::hash(&payload).as_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Read the committed generation of an index written by [`VectorStore::persist`].
    pub fn load(dir: &Path) -> Result<Self> {
        let mut paths = IndexPaths::new(dir);
        let mut retries = 0;
        loop {
            let result = Self::read_generation(dir, &paths);
            if matches!(result, Err(Error::IndexNotFound(_) | Error::Io { .. })) && retries < LOAD_RETRIES {
                let latest = IndexPaths::new(dir);
                if latest != paths {
                    debug!(dir = %dir.display(), "index generation moved during load, retrying");
                    paths = latest;
                    retries += 1;
                    continue;
                }
            }
            return result;
        }
    }

    fn read_generation(dir: &Path, paths: &IndexPaths) -> Result<Self> {
        if !paths.exists() {
            return Err(Error::IndexNotFound(dir.to_path_buf()));
        }
        let bytes = fs::read(&paths.vectors).map_err(|e| Error::io(&paths.vectors, e))?;
        let meta = fs::read(&paths.meta).map_err(|e| Error::io(&paths.meta, e))?;

        let mut cur = bytes.as_slice();
        if take(&mut cur, MAGIC.len())? != MAGIC {
            return Err(corrupt("vector file has an unknown signature"));
        }
        let version = read_u32(&mut cur)?;
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported vector file version {version}")));
        }
        let dim = read_u32(&mut cur)? as usize;
        let count = usize::try_from(read_u64(&mut cur)?)
            .map_err(|_| corrupt("entry count does not fit in memory"))?;
        let model_len = read_u32(&mut cur)? as usize;
        let model = std::str::from_utf8(take(&mut cur, model_len)?)
            .map_err(|_| corrupt("embedding model name is not UTF-8"))?
            .to_string();
        let meta_digest = take(&mut cur, DIGEST_LEN)?;
        let payload_digest = take(&mut cur, DIGEST_LEN)?;

        if blake3::hash(&meta).as_bytes().as_slice() != meta_digest {
            return Err(corrupt("metadata file does not belong to this vector file"));
        }
        let expected = count
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| corrupt("header sizes overflow"))?;
        if cur.len() != expected {
            return Err(corrupt(format!(
                "vector payload is {} bytes, expected {expected} for {count} x {dim}",
                cur.len()
            )));
        }
        if blake3::hash(cur).as_bytes().as_slice() != payload_digest {
            return Err(corrupt("vector payload checksum mismatch"));
        }

        let chunks: Vec<Chunk> = serde_json::from_slice(&meta)
            .map_err(|e| corrupt(format!("metadata is not a list of chunks: {e}")))?;
        if chunks.len() != count {
            return Err(corrupt(format!(
                "metadata has {} entries but vector file has {count}",
                chunks.len()
            )));
        }
        let vectors: Vec<f32> = cur
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        debug!(dir = %dir.display(), generation = ?paths.generation, entries = count, dim, "loaded index");
        let model = (!model.is_empty()).then_some(model);
        Ok(Self::from_parts(dim, model, vectors, chunks))
    }
}

/// Number of chunk records in the committed `meta.json`, or 0 if it cannot be read.
pub fn meta_len(dir: &Path) -> usize {
    let paths = IndexPaths::new(dir);
    fs::read(&paths.meta)
        .ok()
        .and_then(|b| serde_json::from_slice::<Vec<serde_json::Value>>(&b).ok())
        .map_or(0, |v| v.len())
}

fn write_atomic<F>(dir: &Path, dest: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> std::io::Result<()>,
{
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    {
        let mut w = BufWriter::new(&mut tmp);
        write(&mut w).and_then(|()| w.flush()).map_err(|e| Error::io(dest, e))?;
    }
    tmp.as_file().sync_all().map_err(|e| Error::io(dest, e))?;
    tmp.persist(dest).map_err(|e| Error::io(dest, e.error))?;
    Ok(())
}

/// Remove generations other than the live one and the one it replaced.
fn prune_generations(dir: &Path, live: &str, previous: Option<&str>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_generation_name(&name) || name == live || Some(name.as_str()) == previous {
            continue;
        }
        if let Err(e) = fs::remove_dir_all(entry.path()) {
            warn!(path = %entry.path().display(), error = %e, "failed to remove stale index generation");
        }
    }
}

fn to_u32(n: usize) -> Result<u32> {
    u32::try_from(n).map_err(|_| corrupt(format!("{n} does not fit the u32 header field")))
}

fn corrupt(reason: impl Into<String>) -> Error {
    Error::CorruptIndex(reason.into())
}

fn take<'a>(cur: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if cur.len() < n {
        return Err(corrupt("vector file is truncated"));
    }
    let (head, tail) = cur.split_at(n);
    *cur = tail;
    Ok(head)
}

fn read_u32(cur: &mut &[u8]) -> Result<u32> {
    let b = take(cur, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u64(cur: &mut &[u8]) -> Result<u64> {
    let b = take(cur, 8)?;
    let mut arr = [0u8; 8];
    arr.copy_from_slice(b);
    Ok(u64::from_le_bytes(arr))
}
