use std::collections::HashMap;
use std::fs::File;
use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use crate::codec::{PostingsEncoder, TermIndexCtx};
use crate::compression::varint;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::SegmentStats;
use crate::core::types::{DocId, TermId};

/// Term-hash partition count for the commit-time sort. Partitions are
/// disjoint, so they sort without coordination.
const PARTITIONS: usize = 32;

/// One staged posting, flattened for sorting. `hits_offset` points at the
/// hit stream inside `ranges[range_idx]`.
#[derive(Clone, Copy, Debug)]
struct SegmentData {
    term_id: TermId,
    doc_id: DocId,
    hits_offset: u32,
    hits_count: u16,
    range_idx: u8,
}

/// Run the three commit phases over the staged ranges: collect postings,
/// sort the partitions in parallel, and drive the encoder term by term.
/// Returns the per-term encoder contexts for the dictionary.
pub(crate) fn drive(
    ranges: &[&[u8]],
    enc: &mut dyn PostingsEncoder,
    index_file: &mut File,
    flush_threshold: usize,
    stats: &mut SegmentStats,
) -> Result<HashMap<TermId, TermIndexCtx>> {
    let before = Instant::now();
    let mut partitions = collect(ranges, stats)?;
    debug!(
        "collected {} postings in {:?}",
        partitions.iter().map(|p| p.len()).sum::<usize>(),
        before.elapsed()
    );

    let before = Instant::now();
    partitions
        .par_iter_mut()
        .for_each(|partition| partition.sort_unstable_by_key(|d| (d.term_id, d.doc_id)));
    debug!("sorted {} partitions in {:?}", PARTITIONS, before.elapsed());

    let before = Instant::now();
    let terms = encode(ranges, &partitions, enc, index_file, flush_threshold, stats)?;
    debug!("encoded {} terms in {:?}", terms.len(), before.elapsed());

    Ok(terms)
}

/// Parse every staged document frame and flatten it into per-term-hash
/// partitions. Zero-term frames are skipped and do not count as documents.
fn collect(ranges: &[&[u8]], stats: &mut SegmentStats) -> Result<Vec<Vec<SegmentData>>> {
    let mut partitions: Vec<Vec<SegmentData>> = (0..PARTITIONS).map(|_| Vec::new()).collect();

    for (range_idx, range) in ranges.iter().enumerate() {
        if range.len() > u32::MAX as usize {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "staging range exceeds 4 GiB".to_string(),
            ));
        }

        let mut at = 0usize;
        while at < range.len() {
            let doc_id = read_u32_le(range, &mut at)?;
            let term_count = read_u16_le(range, &mut at)?;
            if term_count == 0 {
                continue;
            }
            stats.docs_count += 1;

            for _ in 0..term_count {
                let term_id = read_u32_le(range, &mut at)?;
                let hits_count = read_u16_le(range, &mut at)?;
                let hits_offset = at as u32;

                // Walk past the hit stream to find the next term.
                let mut payload_len = 0usize;
                for _ in 0..hits_count {
                    let mask = varint::decode_u32(range, &mut at)?;
                    if mask & 1 == 0 {
                        payload_len = varint::decode_u32(range, &mut at)? as usize;
                    }
                    if range.len() - at < payload_len {
                        return Err(Error::corrupt("staged hit payload truncated"));
                    }
                    at += payload_len;
                }

                partitions[(term_id as usize) & (PARTITIONS - 1)].push(SegmentData {
                    term_id,
                    doc_id,
                    hits_offset,
                    hits_count,
                    range_idx: range_idx as u8,
                });
            }
        }
    }

    Ok(partitions)
}

/// Walk the sorted partitions and emit each maximal equal-term run to the
/// encoder, re-decoding hit streams from their source ranges.
fn encode(
    ranges: &[&[u8]],
    partitions: &[Vec<SegmentData>],
    enc: &mut dyn PostingsEncoder,
    index_file: &mut File,
    flush_threshold: usize,
    stats: &mut SegmentStats,
) -> Result<HashMap<TermId, TermIndexCtx>> {
    let mut terms = HashMap::new();

    for partition in partitions {
        let mut i = 0;
        while i < partition.len() {
            let term_id = partition[i].term_id;
            enc.begin_term();

            let mut prev_doc: Option<DocId> = None;
            let mut docs_in_run = 0u64;
            while i < partition.len() && partition[i].term_id == term_id {
                let entry = partition[i];
                if prev_doc.map_or(false, |prev| entry.doc_id <= prev) {
                    // The duplicate-update guard makes this unreachable
                    // short of staging corruption.
                    return Err(Error::new(
                        ErrorKind::InvalidState,
                        format!("document ids out of order for term {}", term_id),
                    ));
                }

                let range = ranges[entry.range_idx as usize];
                let mut at = entry.hits_offset as usize;
                let mut position = 0u32;
                let mut payload_len = 0usize;

                enc.begin_document(entry.doc_id);
                for _ in 0..entry.hits_count {
                    let mask = varint::decode_u32(range, &mut at)?;
                    if mask & 1 == 0 {
                        payload_len = varint::decode_u32(range, &mut at)? as usize;
                    }
                    position += mask >> 1;
                    if range.len() - at < payload_len {
                        return Err(Error::corrupt("staged hit payload truncated"));
                    }
                    enc.new_hit(position, &range[at..at + payload_len]);
                    at += payload_len;
                }
                enc.end_document();

                stats.sum_term_hits += entry.hits_count as u64;
                docs_in_run += 1;
                prev_doc = Some(entry.doc_id);
                i += 1;
            }

            let mut ctx = TermIndexCtx::default();
            enc.end_term(&mut ctx);
            terms.insert(term_id, ctx);
            stats.total_terms += 1;
            stats.sum_terms_docs += docs_in_run;

            if flush_threshold > 0 && enc.buffered() > flush_threshold {
                enc.flush_index(index_file)?;
            }
        }
    }

    Ok(terms)
}

fn read_u32_le(data: &[u8], at: &mut usize) -> Result<u32> {
    if data.len() - *at < 4 {
        return Err(Error::corrupt("staging frame truncated"));
    }
    let value = u32::from_le_bytes([data[*at], data[*at + 1], data[*at + 2], data[*at + 3]]);
    *at += 4;
    Ok(value)
}

fn read_u16_le(data: &[u8], at: &mut usize) -> Result<u16> {
    if data.len() - *at < 2 {
        return Err(Error::corrupt("staging frame truncated"));
    }
    let value = u16::from_le_bytes([data[*at], data[*at + 1]]);
    *at += 2;
    Ok(value)
}
