use crate::core::types::DocId;
use crate::updates::bitmap::UpdatedDocuments;

/// One-shot membership tester over a packed updated-documents set.
///
/// Queries must arrive in non-decreasing document ID order; the scanner
/// only ever moves its bank cursor forward. Once a query exceeds the
/// set's highest ID (or the skip list runs out) the scanner is *drained*
/// and answers false forever.
pub struct UpdatedDocumentsScanner<'a> {
    set: UpdatedDocuments<'a>,
    /// Index of the current bank in the skip list.
    cursor: usize,
    /// Base document ID of the current bank.
    cur_base: DocId,
    max_doc_id: DocId,
    drained: bool,
}

impl<'a> UpdatedDocumentsScanner<'a> {
    pub fn new(set: &UpdatedDocuments<'a>) -> Self {
        UpdatedDocumentsScanner {
            set: *set,
            cursor: 0,
            cur_base: set.skip_entry(0),
            max_doc_id: set.highest_id(),
            drained: false,
        }
    }

    pub fn drained(&self) -> bool {
        self.drained
    }

    /// Test `id` for membership. Successive calls must use non-decreasing IDs.
    pub fn test(&mut self, id: DocId) -> bool {
        if self.drained {
            return false;
        }
        if id > self.max_doc_id {
            self.drained = true;
            return false;
        }
        if id < self.cur_base {
            // The caller skipped past this bank; it stays current.
            return false;
        }

        let span = self.set.ids_per_bank();
        if id - self.cur_base >= span {
            // Advance to the last bank whose base is <= id. Queries are
            // monotone, so a linear walk is amortized O(1).
            let mut next = self.cursor;
            while next + 1 < self.set.bank_count() && self.set.skip_entry(next + 1) <= id {
                next += 1;
            }

            if id - self.set.skip_entry(next) >= span {
                // id falls in a gap; park on the following bank if any.
                if next + 1 >= self.set.bank_count() {
                    self.drained = true;
                    return false;
                }
                self.cursor = next + 1;
                self.cur_base = self.set.skip_entry(next + 1);
                return false;
            }

            self.cursor = next;
            self.cur_base = self.set.skip_entry(next);
        }

        let rel = (id - self.cur_base) as usize;
        (self.set.bank(self.cursor)[rel >> 3] >> (rel & 7)) & 1 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updates::bitmap::{pack_updates, unpack_updates};

    #[test]
    fn ascending_probe_over_sparse_banks() {
        let mut ids = vec![1, 2, 4096, 4097, 10_000_000];
        let mut buf = Vec::new();
        pack_updates(&mut ids, &mut buf);
        let ud = unpack_updates(&buf).unwrap();

        let mut scanner = UpdatedDocumentsScanner::new(&ud);
        let probes = [0, 1, 2, 3, 4096, 4097, 4098, 10_000_000, 10_000_001];
        let expected = [false, true, true, false, true, true, false, true, false];
        for (&id, &want) in probes.iter().zip(expected.iter()) {
            assert_eq!(scanner.test(id), want, "probe {}", id);
        }
        assert!(scanner.drained());
    }

    #[test]
    fn drained_is_terminal() {
        let mut ids = vec![5];
        let mut buf = Vec::new();
        pack_updates(&mut ids, &mut buf);
        let ud = unpack_updates(&buf).unwrap();

        let mut scanner = UpdatedDocumentsScanner::new(&ud);
        assert!(!scanner.test(6));
        assert!(scanner.drained());
        assert!(!scanner.test(5));
        assert!(!scanner.test(1_000_000));
    }

    #[test]
    fn query_in_gap_parks_on_next_bank() {
        let mut ids = vec![10, 100_000];
        let mut buf = Vec::new();
        pack_updates(&mut ids, &mut buf);
        let ud = unpack_updates(&buf).unwrap();

        let mut scanner = UpdatedDocumentsScanner::new(&ud);
        assert!(scanner.test(10));
        assert!(!scanner.test(50_000)); // between banks
        assert!(!scanner.drained());
        assert!(scanner.test(100_000));
    }
}
