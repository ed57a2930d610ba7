//! localrag-core
//!
//! Shared types, errors, layered configuration, document scanning and
//! chunking, and the traits the embedding, chat and lookup clients implement.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
