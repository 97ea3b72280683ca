use serde::{Deserialize, Serialize};

/// Per-segment counters accumulated during commit and written once into
/// the segment's `id` metadata file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentStats {
    /// Documents that contributed at least one term.
    pub docs_count: u64,
    /// Distinct terms emitted to the encoder.
    pub total_terms: u64,
    /// Sum of hit counts over all (document, term) pairs.
    pub sum_term_hits: u64,
    /// Sum of document counts over all terms.
    pub sum_terms_docs: u64,
}
