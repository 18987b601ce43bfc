pub mod client;
pub mod memory;
pub mod record;
pub mod rest;

pub use client::{Backend, BackendError, Bucket, Result};
pub use memory::MemoryBackend;
pub use rest::RestBackend;
