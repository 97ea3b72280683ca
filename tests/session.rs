mod common;

use std::fs;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use common::{Event, RecordingSession};
use segforge::codec::plain::PlainSession;
use segforge::{
    unpack_updates, ErrorKind, SegmentIndexSession, SegmentStats, SessionConfig,
    UpdatedDocumentsScanner,
};

#[test]
fn two_terms_one_document() {
    let dir = tempdir().unwrap();
    let mut session = SegmentIndexSession::default();
    let a = session.term_id("a").unwrap();
    let b = session.term_id("b").unwrap();

    let mut doc = session.begin(10);
    doc.insert(a, 1, b"").unwrap();
    doc.insert(b, 2, b"x").unwrap();
    doc.commit().unwrap();

    let mut codec = RecordingSession::new(dir.path());
    let stats = session.commit(&mut codec).unwrap();
    assert_eq!(
        stats,
        SegmentStats {
            docs_count: 1,
            total_terms: 2,
            sum_term_hits: 2,
            sum_terms_docs: 2,
        }
    );

    assert_eq!(
        codec.events(),
        vec![
            Event::BeginTerm,
            Event::BeginDocument(10),
            Event::Hit(1, vec![]),
            Event::EndDocument,
            Event::EndTerm,
            Event::BeginTerm,
            Event::BeginDocument(10),
            Event::Hit(2, b"x".to_vec()),
            Event::EndDocument,
            Event::EndTerm,
        ]
    );

    let terms = codec.sorted_terms();
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0].0, b"a");
    assert_eq!(terms[0].1.documents, 1);
    assert_eq!(terms[1].0, b"b");
    assert_eq!(terms[1].1.documents, 1);

    // The staged index was renamed and only the expected files exist.
    assert!(dir.path().join("index").exists());
    assert!(!dir.path().join("index.t").exists());
    assert!(!dir.path().join("updated_documents.ids").exists());

    let id = fs::read(dir.path().join("id")).unwrap();
    let mut expected = vec![1u8, 9];
    expected.extend_from_slice(b"recording");
    expected.extend_from_slice(&2u64.to_le_bytes()); // sum_term_hits
    expected.extend_from_slice(&2u64.to_le_bytes()); // total_terms
    expected.extend_from_slice(&2u64.to_le_bytes()); // sum_terms_docs
    expected.extend_from_slice(&1u64.to_le_bytes()); // docs_count
    assert_eq!(id, expected);
}

#[test]
fn duplicate_document_with_interleaved_ids() {
    let mut session = SegmentIndexSession::default();
    let term = session.term_id("a").unwrap();

    for doc_id in [5u32, 80_000, 3] {
        let mut doc = session.begin(doc_id);
        doc.insert(term, 1, b"").unwrap();
        doc.commit().unwrap();
    }

    let mut doc = session.begin(5);
    doc.insert(term, 1, b"").unwrap();
    assert_eq!(doc.commit().unwrap_err().kind, ErrorKind::DuplicateDocument);
}

#[test]
fn overlapping_positions_are_counted_and_kept() {
    let dir = tempdir().unwrap();
    let mut session = SegmentIndexSession::default();
    let a = session.term_id("a").unwrap();

    let mut doc = session.begin(100);
    doc.insert(a, 1, b"").unwrap();
    doc.insert(a, 1, b"").unwrap();
    assert_eq!(doc.position_overlaps(), 1);
    doc.commit().unwrap();

    let mut codec = RecordingSession::new(dir.path());
    let stats = session.commit(&mut codec).unwrap();
    assert_eq!(stats.total_terms, 1);
    assert_eq!(stats.sum_term_hits, 2);

    assert_eq!(
        codec.events(),
        vec![
            Event::BeginTerm,
            Event::BeginDocument(100),
            Event::Hit(1, vec![]),
            Event::Hit(1, vec![]),
            Event::EndDocument,
            Event::EndTerm,
        ]
    );
}

#[test]
fn statistics_over_a_small_matrix() {
    let dir = tempdir().unwrap();
    let mut session = SegmentIndexSession::default();
    let a = session.term_id("a").unwrap();
    let b = session.term_id("b").unwrap();
    let c = session.term_id("c").unwrap();

    let mut doc = session.begin(1);
    doc.insert(a, 1, b"").unwrap();
    doc.insert(b, 2, b"").unwrap();
    doc.insert(a, 3, b"").unwrap();
    doc.commit().unwrap();

    let mut doc = session.begin(2);
    doc.insert(a, 1, b"").unwrap();
    doc.commit().unwrap();

    let mut doc = session.begin(3);
    doc.insert(b, 1, b"").unwrap();
    doc.insert(c, 2, b"").unwrap();
    doc.commit().unwrap();

    let mut codec = RecordingSession::new(dir.path());
    let stats = session.commit(&mut codec).unwrap();
    assert_eq!(
        stats,
        SegmentStats {
            docs_count: 3,
            total_terms: 3,
            sum_term_hits: 6,
            sum_terms_docs: 5,
        }
    );
}

#[test]
fn replaced_and_erased_documents_are_masked() {
    let dir = tempdir().unwrap();
    let mut session = SegmentIndexSession::default();
    let term = session.term_id("fresh").unwrap();

    let mut doc = session.begin(42);
    doc.insert(term, 1, b"").unwrap();
    doc.commit_replace().unwrap();

    session.erase(7).unwrap();
    session.erase(9000).unwrap();

    let mut codec = RecordingSession::new(dir.path());
    session.commit(&mut codec).unwrap();

    let packed = fs::read(dir.path().join("updated_documents.ids")).unwrap();
    let ud = unpack_updates(&packed).unwrap();
    assert_eq!(ud.lowest_id(), 7);
    assert_eq!(ud.highest_id(), 9000);

    let mut scanner = UpdatedDocumentsScanner::new(&ud);
    assert!(!scanner.test(1));
    assert!(scanner.test(7));
    assert!(scanner.test(42));
    assert!(!scanner.test(43));
    assert!(scanner.test(9000));
}

#[test]
fn empty_document_counts_nothing() {
    let dir = tempdir().unwrap();
    let mut session = SegmentIndexSession::default();

    let doc = session.begin(10);
    doc.commit().unwrap();

    let mut codec = RecordingSession::new(dir.path());
    let stats = session.commit(&mut codec).unwrap();
    assert_eq!(stats, SegmentStats::default());
    assert!(codec.events().is_empty());
}

fn build_random_session(intermediate_flush_threshold: usize) -> SegmentIndexSession {
    let mut session = SegmentIndexSession::new(SessionConfig {
        intermediate_flush_threshold,
        ..SessionConfig::default()
    });

    let mut rng = StdRng::seed_from_u64(0x5e6f0e5e);
    for doc_id in 1..=1000u32 {
        let mut doc = session.begin(doc_id);
        let term_count = rng.gen_range(1..=5);
        let mut position = 0u32;
        for _ in 0..term_count {
            let term = format!("term{}", rng.gen_range(0..50));
            position += rng.gen_range(1..20);
            let payload_len = rng.gen_range(0..=8);
            let payload: Vec<u8> = (0..payload_len).map(|_| rng.gen()).collect();
            doc.insert_term(&term, position, &payload).unwrap();
        }
        if doc_id % 7 == 0 {
            doc.commit_replace().unwrap();
        } else {
            doc.commit().unwrap();
        }
    }
    session
}

/// Per term, the encoder must see documents in strictly increasing order
/// and each document's hits with non-decreasing positions.
#[test]
fn encoder_sees_ordered_documents_and_positions() {
    let dir = tempdir().unwrap();
    let session = build_random_session(0);
    let mut codec = RecordingSession::new(dir.path());
    session.commit(&mut codec).unwrap();

    let events = codec.events();
    assert!(!events.is_empty());
    let mut prev_doc: Option<u32> = None;
    let mut prev_pos = 0u32;
    for event in &events {
        match event {
            Event::BeginTerm => prev_doc = None,
            Event::BeginDocument(doc) => {
                if let Some(prev) = prev_doc {
                    assert!(*doc > prev, "doc {} after {}", doc, prev);
                }
                prev_doc = Some(*doc);
                prev_pos = 0;
            }
            Event::Hit(pos, _) => {
                assert!(*pos >= prev_pos);
                prev_pos = *pos;
            }
            _ => {}
        }
    }
}

/// Commit output must be byte-identical whether the staging buffer stayed
/// in memory or spilled to disk on every document.
#[test]
fn spill_is_transparent_to_the_encoder() {
    let mut logs = Vec::new();
    for threshold in [0usize, 1] {
        let dir = tempdir().unwrap();
        let session = build_random_session(threshold);
        let mut codec = RecordingSession::new(dir.path());
        let stats = session.commit(&mut codec).unwrap();
        logs.push((codec.events(), codec.sorted_terms(), stats));
    }
    assert_eq!(logs[0], logs[1]);
}

/// Same property at the file level, with the real codec and a threshold
/// that leaves a residual in-memory range alongside the spill file.
#[test]
fn spill_is_transparent_on_disk() {
    let mut artifacts = Vec::new();
    for threshold in [0usize, 4096] {
        let dir = tempdir().unwrap();
        let session = build_random_session(threshold);
        let mut codec = PlainSession::new(dir.path());
        session.commit(&mut codec).unwrap();
        artifacts.push((
            fs::read(dir.path().join("index")).unwrap(),
            fs::read(dir.path().join("terms")).unwrap(),
            fs::read(dir.path().join("id")).unwrap(),
            fs::read(dir.path().join("updated_documents.ids")).unwrap(),
        ));
    }
    assert_eq!(artifacts[0], artifacts[1]);
}

/// With the plain codec the index file must match the encoder's chunk
/// accounting, also when the mid-commit flush threshold kicks in.
#[test]
fn plain_codec_round_trip_with_flush_threshold() {
    let dir = tempdir().unwrap();
    let mut session = SegmentIndexSession::new(SessionConfig {
        flush_threshold: 32,
        ..SessionConfig::default()
    });

    for doc_id in 1..=100u32 {
        let mut doc = session.begin(doc_id);
        doc.insert_term("alpha", 1, b"").unwrap();
        doc.insert_term(&format!("term{}", doc_id % 10), 2, b"pp").unwrap();
        doc.commit().unwrap();
    }

    let mut codec = PlainSession::new(dir.path());
    let stats = session.commit(&mut codec).unwrap();
    assert_eq!(stats.docs_count, 100);

    let index = fs::read(dir.path().join("index")).unwrap();
    assert!(!index.is_empty());
    assert!(dir.path().join("terms").exists());

    let id = fs::read(dir.path().join("id")).unwrap();
    assert_eq!(id[0], 1);
    assert_eq!(&id[2..2 + id[1] as usize], b"plain.1");
}
