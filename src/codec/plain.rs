use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::codec::{CodecSession, PostingsEncoder, TermIndexCtx};
use crate::compression::varint;
use crate::core::error::{Error, Result};
use crate::core::types::DocId;

pub const CODEC_ID: &[u8] = b"plain.1";

/// Minimal shippable codec: delta-varint document IDs, varint hit counts,
/// positions and payload lengths. No block compression, no skip data.
///
/// Per term: for each document `varint(docid delta) varint(hit_count)`,
/// then per hit `varint(position) varint(payload_len) payload`.
/// The terms file holds length-prefixed `(term, ctx)` entries.
pub struct PlainSession {
    base_path: PathBuf,
}

impl PlainSession {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        PlainSession {
            base_path: base_path.into(),
        }
    }
}

impl CodecSession for PlainSession {
    fn codec_identifier(&self) -> Vec<u8> {
        CODEC_ID.to_vec()
    }

    fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn new_encoder(&mut self) -> Box<dyn PostingsEncoder> {
        Box::new(PlainEncoder::default())
    }

    fn persist_terms(&mut self, mut terms: Vec<(Box<[u8]>, TermIndexCtx)>) -> Result<()> {
        // Entries arrive in unspecified order; the dictionary is sorted.
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let mut buf = Vec::new();
        for (term, ctx) in &terms {
            buf.push(term.len() as u8);
            buf.extend_from_slice(term);
            buf.extend_from_slice(&ctx.documents.to_le_bytes());
            buf.extend_from_slice(&ctx.chunk_offset.to_le_bytes());
            buf.extend_from_slice(&ctx.chunk_size.to_le_bytes());
        }

        let path = self.base_path.join("terms");
        let mut file = File::create(path).map_err(Error::commit)?;
        file.write_all(&buf).map_err(Error::commit)?;
        file.sync_all().map_err(Error::commit)?;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct PlainEncoder {
    out: Vec<u8>,
    /// Bytes already drained to the index file.
    flushed: u64,
    term_start: u64,
    documents: u32,
    prev_doc: DocId,
    /// Hit stream of the open document, emitted behind its count.
    doc_hits: Vec<u8>,
    doc_hit_count: u32,
}

impl PostingsEncoder for PlainEncoder {
    fn begin_term(&mut self) {
        self.term_start = self.flushed + self.out.len() as u64;
        self.documents = 0;
        self.prev_doc = 0;
    }

    fn begin_document(&mut self, doc_id: DocId) {
        varint::encode_u32(&mut self.out, doc_id - self.prev_doc);
        self.prev_doc = doc_id;
        self.doc_hits.clear();
        self.doc_hit_count = 0;
    }

    fn new_hit(&mut self, position: u32, payload: &[u8]) {
        varint::encode_u32(&mut self.doc_hits, position);
        varint::encode_u32(&mut self.doc_hits, payload.len() as u32);
        self.doc_hits.extend_from_slice(payload);
        self.doc_hit_count += 1;
    }

    fn end_document(&mut self) {
        varint::encode_u32(&mut self.out, self.doc_hit_count);
        self.out.extend_from_slice(&self.doc_hits);
        self.documents += 1;
    }

    fn end_term(&mut self, ctx: &mut TermIndexCtx) {
        ctx.documents = self.documents;
        ctx.chunk_offset = self.term_start;
        ctx.chunk_size = (self.flushed + self.out.len() as u64 - self.term_start) as u32;
    }

    fn buffered(&self) -> usize {
        self.out.len()
    }

    fn flush_index(&mut self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.out).map_err(Error::commit)?;
        self.flushed += self.out.len() as u64;
        self.out.clear();
        Ok(())
    }
}
