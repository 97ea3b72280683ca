pub mod plain;

use std::io::Write;
use std::path::Path;

use crate::core::error::Result;
use crate::core::types::DocId;

/// Opaque-to-the-planner descriptor of one encoded term.
///
/// The planner only reads `chunk_size`, to verify at persist time that the
/// index file is exactly the sum of the per-term chunks. Everything else is
/// codec-private and flows untouched into the terms dictionary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TermIndexCtx {
    /// Documents posted for this term.
    pub documents: u32,
    /// Byte offset of this term's chunk within the final index file.
    pub chunk_offset: u64,
    /// Size in bytes of this term's chunk.
    pub chunk_size: u32,
}

/// Posting-list encoder driven by the commit planner.
///
/// Calls arrive as `begin_term`, then for each document (strictly
/// increasing IDs) `begin_document`, `new_hit` per hit in position order,
/// `end_document`, and finally `end_term`. Encoded output accumulates in
/// an internal buffer until [`PostingsEncoder::flush_index`] drains it.
pub trait PostingsEncoder {
    fn begin_term(&mut self);

    fn begin_document(&mut self, doc_id: DocId);

    fn new_hit(&mut self, position: u32, payload: &[u8]);

    fn end_document(&mut self);

    fn end_term(&mut self, ctx: &mut TermIndexCtx);

    /// Encoded bytes buffered and not yet flushed.
    fn buffered(&self) -> usize;

    /// Append all buffered bytes to `out` and clear the internal buffer.
    fn flush_index(&mut self, out: &mut dyn Write) -> Result<()>;
}

/// One codec-side segment build: encoder factory plus the dictionary and
/// metadata surface the persister needs.
pub trait CodecSession {
    /// Identifier written into the segment's `id` file; a reader picks its
    /// decoder by this. At most 255 bytes.
    fn codec_identifier(&self) -> Vec<u8>;

    /// Directory the segment's files are written under.
    fn base_path(&self) -> &Path;

    /// Invoked once before any encoding.
    fn begin(&mut self) -> Result<()>;

    fn new_encoder(&mut self) -> Box<dyn PostingsEncoder>;

    /// Persist the terms dictionary. Entry order is unspecified; the
    /// dictionary writer sorts if it needs to.
    fn persist_terms(&mut self, terms: Vec<(Box<[u8]>, TermIndexCtx)>) -> Result<()>;

    /// Invoked once after all segment files are written.
    fn end(&mut self) -> Result<()>;
}
