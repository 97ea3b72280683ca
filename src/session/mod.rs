pub mod dictionary;
pub mod index_session;
pub(crate) mod planner;
pub mod tracker;

pub use dictionary::TermDictionary;
pub use index_session::{DocumentProxy, SegmentIndexSession};
pub use tracker::UpdateTracker;
