pub mod codec;
pub mod compression;
pub mod core;
pub mod session;
pub mod storage;
pub mod updates;

pub use crate::core::config::SessionConfig;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::stats::SegmentStats;
pub use crate::core::types::{
    DocId, TermId, MAX_DOCID, MAX_PAYLOAD_SIZE, MAX_POSITION, MAX_TERM_LENGTH,
};
pub use crate::session::{DocumentProxy, SegmentIndexSession};
pub use crate::updates::{
    pack_updates, unpack_updates, MaskedDocumentsRegistry, UpdatedDocuments,
    UpdatedDocumentsScanner,
};
