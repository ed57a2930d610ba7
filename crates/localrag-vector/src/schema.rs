//! On-disk layout of a persisted index.
//!
//! An artifacts directory holds one or more generations and a pointer file:
//!
//! ```text
//! artifacts/
//!   CURRENT            name of the committed generation, e.g. `gen-3f9a0c2d71be4e05`
//!   gen-3f9a0c2d71be4e05/
//!     vectors.bin
//!     meta.json
//! ```
//!
//! A generation is written completely before `CURRENT` is renamed over, so
//! the pointer swap is the single commit point of a rebuild. Generation names
//! come from the BLAKE3 hash of their `vectors.bin`, and the generation that
//! was live before the swap is kept so readers that already resolved it can
//! finish.
//!
//! Inside a generation the two artifacts correspond 1:1 by position:
//!
//! - `vectors.bin`: header followed by `count * dim` little-endian `f32`
//!   values, row-major, one row per internal id.
//! - `meta.json`: JSON array of `{source, chunk_id, text}` in internal-id order.
//!
//! Header fields, all little-endian:
//!
//! | field          | size          |
//! |----------------|---------------|
//! | magic          | 8 (`LRAGVEC\0`) |
//! | format version | 4             |
//! | dim            | 4             |
//! | count          | 8             |
//! | model length   | 4             |
//! | model name     | model length (UTF-8, empty if unknown) |
//! | meta digest    | 32 (BLAKE3 of `meta.json` bytes) |
//! | payload digest | 32 (BLAKE3 of the vector payload) |

use std::fs;
use std::path::{Path, PathBuf};

pub const MAGIC: &[u8; 8] = b"LRAGVEC\0";
pub const FORMAT_VERSION: u32 = 1;
pub const VECTORS_FILE: &str = "vectors.bin";
pub const META_FILE: &str = "meta.json";
pub const POINTER_FILE: &str = "CURRENT";
pub const GENERATION_PREFIX: &str = "gen-";
pub const DIGEST_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub dir: PathBuf,
    pub generation: Option<String>,
    pub vectors: PathBuf,
    pub meta: PathBuf,
}

impl IndexPaths {
    /// Artifacts of the generation `CURRENT` points at. Before the first
    /// commit the paths sit directly under `dir` and never exist.
    pub fn new(dir: &Path) -> Self {
        match read_pointer(dir) {
            Some(name) => Self::in_generation(dir, &name),
            None => Self {
                dir: dir.to_path_buf(),
                generation: None,
                vectors: dir.join(VECTORS_FILE),
                meta: dir.join(META_FILE),
            },
        }
    }

    pub fn in_generation(dir: &Path, name: &str) -> Self {
        let gen = dir.join(name);
        Self {
            dir: dir.to_path_buf(),
            generation: Some(name.to_string()),
            vectors: gen.join(VECTORS_FILE),
            meta: gen.join(META_FILE),
        }
    }

    pub fn exists(&self) -> bool {
        self.generation.is_some() && self.vectors.is_file() && self.meta.is_file()
    }
}

/// Committed generation name, if `CURRENT` exists and names one.
pub fn read_pointer(dir: &Path) -> Option<String> {
    let name = fs::read_to_string(dir.join(POINTER_FILE)).ok()?;
    let name = name.trim();
    is_generation_name(name).then(|| name.to_string())
}

pub fn is_generation_name(name: &str) -> bool {
    name.strip_prefix(GENERATION_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()))
}
