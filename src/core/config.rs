use std::path::PathBuf;

/// Knobs for one segment index session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Once the in-memory staging buffer grows past this many bytes, it is
    /// appended to an unlinked temp file and cleared. 0 disables spilling.
    pub intermediate_flush_threshold: usize,

    /// During commit, the encoder's buffered output is drained to the index
    /// file whenever it exceeds this many bytes. 0 keeps everything buffered
    /// until the final flush.
    pub flush_threshold: usize,

    /// Directory for the spill temp file. Default: the system temp dir.
    pub spill_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            intermediate_flush_threshold: 0, // spill disabled
            flush_threshold: 0,              // single flush at persist time
            spill_dir: None,
        }
    }
}
