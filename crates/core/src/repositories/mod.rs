//! Persistence gateway adapters.
//!
//! - [`MemoryGateway`]: tables held in process memory
//! - [`FileGateway`]: the same tables persisted as one YAML document

pub mod file_store;
pub mod memory;
pub(crate) mod tables;

pub use file_store::FileGateway;
pub use memory::MemoryGateway;
