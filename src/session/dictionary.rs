use std::collections::HashMap;

use crate::core::error::{Error, Result};
use crate::core::types::{TermId, MAX_TERM_LENGTH};

/// Session-local bidirectional term dictionary.
///
/// IDs are transient: each session numbers its terms densely from 1, and
/// commit resolves IDs back to strings before anything reaches disk. The
/// bytes handed to [`TermDictionary::term_id`] are copied, so the caller's
/// slice need not outlive the call; lookups stay valid until the session
/// is dropped.
#[derive(Default)]
pub struct TermDictionary {
    map: HashMap<Box<[u8]>, TermId>,
    /// term_id - 1 -> term bytes
    terms: Vec<Box<[u8]>>,
}

impl TermDictionary {
    pub fn new() -> Self {
        TermDictionary::default()
    }

    /// Return the ID for `term`, assigning the next dense ID on first sight.
    pub fn term_id(&mut self, term: &[u8]) -> Result<TermId> {
        if term.is_empty() {
            return Err(Error::invalid_input("empty term"));
        }
        if term.len() > MAX_TERM_LENGTH {
            return Err(Error::invalid_input(format!(
                "term of {} bytes exceeds the {} byte limit",
                term.len(),
                MAX_TERM_LENGTH
            )));
        }

        if let Some(&id) = self.map.get(term) {
            return Ok(id);
        }

        let id = (self.terms.len() + 1) as TermId;
        let owned: Box<[u8]> = term.into();
        self.terms.push(owned.clone());
        self.map.insert(owned, id);
        Ok(id)
    }

    /// Term bytes for `id`, or None for an ID this session never assigned.
    pub fn term(&self, id: TermId) -> Option<&[u8]> {
        if id == 0 {
            return None;
        }
        self.terms.get(id as usize - 1).map(|t| &t[..])
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
