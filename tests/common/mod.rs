#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use segforge::codec::{CodecSession, PostingsEncoder, TermIndexCtx};
use segforge::{DocId, Result};

/// One encoder callback, captured verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BeginTerm,
    BeginDocument(DocId),
    Hit(u32, Vec<u8>),
    EndDocument,
    EndTerm,
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Codec session that records every encoder call instead of encoding.
/// Produces an empty index file, which the commit size check accepts
/// because every chunk reports zero bytes.
pub struct RecordingSession {
    base: PathBuf,
    pub events: EventLog,
    pub terms: Rc<RefCell<Vec<(Vec<u8>, TermIndexCtx)>>>,
}

impl RecordingSession {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        RecordingSession {
            base: base.into(),
            events: Rc::new(RefCell::new(Vec::new())),
            terms: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Persisted terms, sorted by term bytes for stable assertions.
    pub fn sorted_terms(&self) -> Vec<(Vec<u8>, TermIndexCtx)> {
        let mut terms = self.terms.borrow().clone();
        terms.sort_by(|a, b| a.0.cmp(&b.0));
        terms
    }
}

impl CodecSession for RecordingSession {
    fn codec_identifier(&self) -> Vec<u8> {
        b"recording".to_vec()
    }

    fn base_path(&self) -> &Path {
        &self.base
    }

    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn new_encoder(&mut self) -> Box<dyn PostingsEncoder> {
        Box::new(RecordingEncoder {
            events: Rc::clone(&self.events),
            documents: 0,
        })
    }

    fn persist_terms(&mut self, terms: Vec<(Box<[u8]>, TermIndexCtx)>) -> Result<()> {
        self.terms
            .borrow_mut()
            .extend(terms.into_iter().map(|(t, ctx)| (t.into_vec(), ctx)));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

struct RecordingEncoder {
    events: EventLog,
    documents: u32,
}

impl PostingsEncoder for RecordingEncoder {
    fn begin_term(&mut self) {
        self.documents = 0;
        self.events.borrow_mut().push(Event::BeginTerm);
    }

    fn begin_document(&mut self, doc_id: DocId) {
        self.documents += 1;
        self.events.borrow_mut().push(Event::BeginDocument(doc_id));
    }

    fn new_hit(&mut self, position: u32, payload: &[u8]) {
        self.events
            .borrow_mut()
            .push(Event::Hit(position, payload.to_vec()));
    }

    fn end_document(&mut self) {
        self.events.borrow_mut().push(Event::EndDocument);
    }

    fn end_term(&mut self, ctx: &mut TermIndexCtx) {
        self.events.borrow_mut().push(Event::EndTerm);
        ctx.documents = self.documents;
    }

    fn buffered(&self) -> usize {
        0
    }

    fn flush_index(&mut self, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }
}
