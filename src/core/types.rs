/// Document identifier. Session-global, totally ordered.
pub type DocId = u32;

/// Session-local term identifier, assigned densely starting at 1.
/// Zero is reserved and never emitted.
pub type TermId = u32;

/// Sentinel meaning "no document".
pub const MAX_DOCID: DocId = u32::MAX;

/// Token positions must be strictly below this.
pub const MAX_POSITION: u32 = 1 << 16;

/// A hit's inline payload is at most this many bytes.
pub const MAX_PAYLOAD_SIZE: usize = 8;

/// Terms longer than this are rejected by the session dictionary.
pub const MAX_TERM_LENGTH: usize = 255;
