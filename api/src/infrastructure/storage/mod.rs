mod core;
mod fs_evidence_store;
pub use core::*;
pub use fs_evidence_store::FsEvidenceStore;
