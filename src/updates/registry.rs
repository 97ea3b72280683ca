use crate::core::types::DocId;
use crate::updates::bitmap::UpdatedDocuments;
use crate::updates::scanner::UpdatedDocumentsScanner;

/// Fans one ascending membership test across several scanners, dropping
/// each scanner as it drains. Scanner order is not preserved.
pub struct MaskedDocumentsRegistry<'a> {
    scanners: Vec<UpdatedDocumentsScanner<'a>>,
}

impl<'a> MaskedDocumentsRegistry<'a> {
    /// Build a registry over `sets`. At most 255 sets are supported.
    pub fn new(sets: &[UpdatedDocuments<'a>]) -> Self {
        assert!(
            sets.len() <= u8::MAX as usize,
            "a registry holds at most 255 scanners"
        );
        MaskedDocumentsRegistry {
            scanners: sets.iter().map(UpdatedDocumentsScanner::new).collect(),
        }
    }

    /// True iff `id` is a member of any underlying set. Successive calls
    /// must use non-decreasing IDs.
    pub fn test(&mut self, id: DocId) -> bool {
        let mut i = 0;
        while i < self.scanners.len() {
            if self.scanners[i].test(id) {
                return true;
            }
            if self.scanners[i].drained() {
                // The scanner swapped into slot i is re-tested at this id.
                self.scanners.swap_remove(i);
            } else {
                i += 1;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}
