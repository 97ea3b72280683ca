use std::fs::{self, File};
use std::io::Write;

use log::debug;

use crate::codec::{CodecSession, PostingsEncoder};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::SegmentStats;
use crate::core::types::DocId;
use crate::storage::layout::SegmentLayout;
use crate::updates::bitmap::pack_updates;

/// Finish a segment whose terms dictionary has already been persisted:
/// drain the encoder, write the updated-documents bitmap and the `id`
/// metadata, fsync, verify the index size and atomically publish
/// `index.t` as `index`.
///
/// Any failure leaves `index.t` in place and no visible segment.
pub(crate) fn finish_segment(
    sess: &mut dyn CodecSession,
    enc: &mut dyn PostingsEncoder,
    mut index_file: File,
    layout: &SegmentLayout,
    updated_document_ids: &mut Vec<DocId>,
    stats: &SegmentStats,
    chunks_total: u64,
) -> Result<()> {
    enc.flush_index(&mut index_file)?;
    sess.end()?;

    // Masked documents, only when the session replaced or erased any.
    let mut packed = Vec::new();
    pack_updates(updated_document_ids, &mut packed);
    if !packed.is_empty() {
        fs::write(layout.updated_documents_path(), &packed).map_err(Error::commit)?;
        debug!(
            "wrote {} masked documents ({} bytes)",
            updated_document_ids.len(),
            packed.len()
        );
    }

    write_segment_id(sess, layout, stats)?;

    index_file.sync_all().map_err(Error::commit)?;

    let index_size = index_file.metadata().map_err(Error::commit)?.len();
    if index_size != chunks_total {
        return Err(Error::corrupt(format!(
            "index file is {} bytes, encoder accounted for {}",
            index_size, chunks_total
        )));
    }

    drop(index_file);
    fs::rename(layout.staged_index_path(), layout.index_path()).map_err(Error::commit)?;

    debug!(
        "segment persisted under {}: {} docs, {} terms, {} index bytes",
        layout.base_dir.display(),
        stats.docs_count,
        stats.total_terms,
        index_size
    );
    Ok(())
}

/// `id` layout: `0x01 | codec_id_len:u8 | codec_id | sum_term_hits:u64 |
/// total_terms:u64 | sum_terms_docs:u64 | docs_count:u64`, little-endian.
fn write_segment_id(
    sess: &dyn CodecSession,
    layout: &SegmentLayout,
    stats: &SegmentStats,
) -> Result<()> {
    let codec_id = sess.codec_identifier();
    if codec_id.len() > u8::MAX as usize {
        return Err(Error::new(
            ErrorKind::InvalidState,
            format!("codec identifier of {} bytes", codec_id.len()),
        ));
    }

    let mut buf = Vec::with_capacity(2 + codec_id.len() + 32);
    buf.push(1u8);
    buf.push(codec_id.len() as u8);
    buf.extend_from_slice(&codec_id);
    buf.extend_from_slice(&stats.sum_term_hits.to_le_bytes());
    buf.extend_from_slice(&stats.total_terms.to_le_bytes());
    buf.extend_from_slice(&stats.sum_terms_docs.to_le_bytes());
    buf.extend_from_slice(&stats.docs_count.to_le_bytes());

    let mut file = File::create(layout.id_path()).map_err(Error::commit)?;
    file.write_all(&buf).map_err(Error::commit)?;
    Ok(())
}
