use std::fs::File;

use log::debug;

use crate::codec::{CodecSession, TermIndexCtx};
use crate::compression::varint;
use crate::core::config::SessionConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::SegmentStats;
use crate::core::types::{DocId, TermId, MAX_DOCID, MAX_PAYLOAD_SIZE, MAX_POSITION};
use crate::session::dictionary::TermDictionary;
use crate::session::planner;
use crate::session::tracker::UpdateTracker;
use crate::storage::layout::SegmentLayout;
use crate::storage::persist;
use crate::storage::spill::SpillFile;

/// Term-hash fan-out for the per-document hit buckets. Pre-partitioning
/// narrows the per-bucket sort; the value never reaches disk.
const ACCUMULATION_BUCKETS: usize = 16;

#[derive(Clone, Copy)]
struct StagedHit {
    term_id: TermId,
    position: u32,
    payload_offset: u32,
    payload_len: u8,
}

/// Builder for one segment.
///
/// Single-producer: the caller interns terms, opens one document at a
/// time via [`SegmentIndexSession::begin`], feeds hits, commits the
/// document, and finally calls [`SegmentIndexSession::commit`] to write
/// the segment. Committed documents accumulate in a framed binary staging
/// buffer that can spill to an unlinked temp file under memory pressure.
pub struct SegmentIndexSession {
    config: SessionConfig,
    dictionary: TermDictionary,
    tracker: UpdateTracker,
    /// Framed staging records, one frame per committed document.
    stage: Vec<u8>,
    spill: Option<SpillFile>,
    /// IDs to mask in older segments (replaced or erased documents).
    updated_document_ids: Vec<DocId>,
    buckets: Vec<Vec<StagedHit>>,
    /// Payload bytes of the open document, referenced by the buckets.
    payload_scratch: Vec<u8>,
}

impl SegmentIndexSession {
    pub fn new(config: SessionConfig) -> Self {
        SegmentIndexSession {
            config,
            dictionary: TermDictionary::new(),
            tracker: UpdateTracker::new(),
            stage: Vec::new(),
            spill: None,
            updated_document_ids: Vec::new(),
            buckets: vec![Vec::new(); ACCUMULATION_BUCKETS],
            payload_scratch: Vec::new(),
        }
    }

    /// Intern `term`, returning its session-local ID.
    pub fn term_id(&mut self, term: &str) -> Result<TermId> {
        self.dictionary.term_id(term.as_bytes())
    }

    /// Term bytes for a previously interned ID.
    pub fn term(&self, id: TermId) -> Option<&[u8]> {
        self.dictionary.term(id)
    }

    /// Open `doc_id` for hit insertion. Dropping the proxy without
    /// committing discards the document.
    pub fn begin(&mut self, doc_id: DocId) -> DocumentProxy<'_> {
        self.payload_scratch.clear();
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        DocumentProxy {
            session: self,
            doc_id,
            last_position: 0,
            position_overlaps: 0,
        }
    }

    /// Mask `doc_id` in older segments without re-adding it.
    pub fn erase(&mut self, doc_id: DocId) -> Result<()> {
        self.claim(doc_id)?;
        self.updated_document_ids.push(doc_id);
        Ok(())
    }

    /// IDs recorded for masking so far.
    pub fn updated_document_ids(&self) -> &[DocId] {
        &self.updated_document_ids
    }

    fn claim(&mut self, doc_id: DocId) -> Result<()> {
        if doc_id == MAX_DOCID {
            return Err(Error::invalid_input("reserved document id"));
        }
        if !self.tracker.try_set(doc_id) {
            return Err(Error::new(
                ErrorKind::DuplicateDocument,
                format!("document {} already committed in this session", doc_id),
            ));
        }
        Ok(())
    }

    /// Append the open document's frame to the staging buffer and spill
    /// if the buffer crossed the configured threshold.
    fn commit_document(&mut self, doc_id: DocId, replace: bool) -> Result<()> {
        self.claim(doc_id)?;
        if replace {
            self.updated_document_ids.push(doc_id);
        }

        self.stage.extend_from_slice(&doc_id.to_le_bytes());
        let term_count_at = self.stage.len();
        self.stage.extend_from_slice(&[0u8; 2]);
        let mut term_count = 0u32;

        for bucket in self.buckets.iter_mut() {
            bucket.sort_unstable_by_key(|hit| (hit.term_id, hit.position));

            let mut i = 0;
            while i < bucket.len() {
                let term_id = bucket[i].term_id;
                self.stage.extend_from_slice(&term_id.to_le_bytes());
                let hit_count_at = self.stage.len();
                self.stage.extend_from_slice(&[0u8; 2]);

                let mut hit_count = 0u32;
                let mut prev_position = 0u32;
                // Sentinel: the first hit of a term always emits its length.
                let mut prev_payload_len = u32::MAX;

                while i < bucket.len() && bucket[i].term_id == term_id {
                    let hit = bucket[i];
                    let delta = hit.position - prev_position;
                    prev_position = hit.position;

                    let payload_len = hit.payload_len as u32;
                    if payload_len == prev_payload_len {
                        varint::encode_u32(&mut self.stage, (delta << 1) | 1);
                    } else {
                        varint::encode_u32(&mut self.stage, delta << 1);
                        varint::encode_u32(&mut self.stage, payload_len);
                        prev_payload_len = payload_len;
                    }
                    if payload_len > 0 {
                        let start = hit.payload_offset as usize;
                        self.stage.extend_from_slice(
                            &self.payload_scratch[start..start + payload_len as usize],
                        );
                    }

                    hit_count += 1;
                    i += 1;
                }

                if hit_count > u16::MAX as u32 {
                    return Err(Error::invalid_input(
                        "more than 65535 hits for one term in one document",
                    ));
                }
                self.stage[hit_count_at..hit_count_at + 2]
                    .copy_from_slice(&(hit_count as u16).to_le_bytes());
                term_count += 1;
            }

            bucket.clear();
        }

        if term_count > u16::MAX as u32 {
            return Err(Error::invalid_input(
                "more than 65535 distinct terms in one document",
            ));
        }
        self.stage[term_count_at..term_count_at + 2]
            .copy_from_slice(&(term_count as u16).to_le_bytes());

        let threshold = self.config.intermediate_flush_threshold;
        if threshold > 0 && self.stage.len() > threshold {
            if self.spill.is_none() {
                self.spill = Some(SpillFile::create(self.config.spill_dir.as_deref())?);
            }
            if let Some(spill) = self.spill.as_mut() {
                spill.append(&self.stage)?;
            }
            self.stage.clear();
        }

        Ok(())
    }

    /// Re-group every staged posting by term, drive `sess`'s encoder and
    /// persist the segment under `sess.base_path()`. Consumes the session:
    /// a commit either completes or leaves `index.t` and no visible
    /// segment.
    pub fn commit(mut self, sess: &mut dyn CodecSession) -> Result<SegmentStats> {
        sess.begin()?;

        let layout = SegmentLayout::new(sess.base_path());
        let mut index_file = File::create(layout.staged_index_path()).map_err(Error::commit)?;
        let mut enc = sess.new_encoder();

        // Both source ranges stay readable for the whole commit: the
        // residual staging buffer, and the mapped spill file if one was
        // created.
        let spill = self.spill.take();
        let mapped = match spill.as_ref() {
            Some(spill) => Some(spill.map()?),
            None => None,
        };
        let mut ranges: Vec<&[u8]> = Vec::with_capacity(2);
        if !self.stage.is_empty() {
            ranges.push(self.stage.as_slice());
        }
        if let Some(mapped) = mapped.as_ref() {
            ranges.push(&mapped[..]);
        }
        debug!(
            "committing {} staged bytes across {} ranges",
            ranges.iter().map(|r| r.len()).sum::<usize>(),
            ranges.len()
        );

        let mut stats = SegmentStats::default();
        let terms = planner::drive(
            &ranges,
            enc.as_mut(),
            &mut index_file,
            self.config.flush_threshold,
            &mut stats,
        )?;

        // Resolve transient term IDs back to their strings; only strings
        // reach the on-disk dictionary.
        let mut chunks_total = 0u64;
        let mut entries: Vec<(Box<[u8]>, TermIndexCtx)> = Vec::with_capacity(terms.len());
        for (term_id, ctx) in terms {
            let bytes = self.dictionary.term(term_id).ok_or_else(|| {
                Error::new(ErrorKind::InvalidState, format!("unknown term id {}", term_id))
            })?;
            chunks_total += ctx.chunk_size as u64;
            entries.push((bytes.into(), ctx));
        }
        sess.persist_terms(entries)?;

        persist::finish_segment(
            sess,
            enc.as_mut(),
            index_file,
            &layout,
            &mut self.updated_document_ids,
            &stats,
            chunks_total,
        )?;

        Ok(stats)
    }
}

impl Default for SegmentIndexSession {
    fn default() -> Self {
        SegmentIndexSession::new(SessionConfig::default())
    }
}

/// One document being filled in. Hits go into 16 term-hash buckets and
/// are framed into the staging buffer on commit.
pub struct DocumentProxy<'a> {
    session: &'a mut SegmentIndexSession,
    doc_id: DocId,
    last_position: u32,
    position_overlaps: u32,
}

impl<'a> DocumentProxy<'a> {
    pub fn doc_id(&self) -> DocId {
        self.doc_id
    }

    /// Hits whose position repeated the previous hit's non-zero position.
    pub fn position_overlaps(&self) -> u32 {
        self.position_overlaps
    }

    /// Record one hit of `term_id` at `position` with an optional payload
    /// of up to 8 bytes. Hits are expected in position order.
    pub fn insert(&mut self, term_id: TermId, position: u32, payload: &[u8]) -> Result<()> {
        if term_id == 0 {
            return Err(Error::invalid_input("term id zero is reserved"));
        }
        if position >= MAX_POSITION {
            return Err(Error::invalid_input(format!(
                "position {} is out of range",
                position
            )));
        }
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::invalid_input(format!(
                "payload of {} bytes exceeds the {} byte limit",
                payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        if position != 0 && position == self.last_position {
            self.position_overlaps += 1;
        }
        self.last_position = position;

        let payload_offset = self.session.payload_scratch.len() as u32;
        self.session.payload_scratch.extend_from_slice(payload);

        self.session.buckets[(term_id as usize) & (ACCUMULATION_BUCKETS - 1)].push(StagedHit {
            term_id,
            position,
            payload_offset,
            payload_len: payload.len() as u8,
        });
        Ok(())
    }

    /// Intern `term` and record a hit for it.
    pub fn insert_term(&mut self, term: &str, position: u32, payload: &[u8]) -> Result<()> {
        let term_id = self.session.dictionary.term_id(term.as_bytes())?;
        self.insert(term_id, position, payload)
    }

    /// Commit the document as a new addition.
    pub fn commit(self) -> Result<()> {
        let DocumentProxy {
            session, doc_id, ..
        } = self;
        session.commit_document(doc_id, false)
    }

    /// Commit the document as a replacement: older segments' copies are
    /// masked via the updated-documents bitmap.
    pub fn commit_replace(self) -> Result<()> {
        let DocumentProxy {
            session, doc_id, ..
        } = self;
        session.commit_document(doc_id, true)
    }
}
