use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use log::debug;
use memmap2::{Mmap, MmapOptions};

use crate::core::error::{Error, Result};

/// Unlinked temp file holding staging overflow.
///
/// The file is removed from the directory the moment it is created, so an
/// abandoned session leaves nothing behind; the open handle keeps the data
/// reachable until the session is dropped or commit maps it.
pub struct SpillFile {
    file: File,
    written: u64,
}

impl SpillFile {
    /// Create the spill file under `dir` (system temp dir when None).
    pub fn create(dir: Option<&Path>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::temp_dir(),
        };
        let path = dir.join(format!(
            "index-intermediate.{}.{}.tmp",
            Utc::now().timestamp_micros(),
            std::process::id()
        ));

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(Error::spill)?;

        // Unlink immediately; the handle is all we need.
        fs::remove_file(&path).map_err(Error::spill)?;
        debug!("spilling staged postings to {}", path.display());

        Ok(SpillFile { file, written: 0 })
    }

    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data).map_err(Error::spill)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Map the spilled bytes for the commit-time reread.
    pub fn map(&self) -> Result<Mmap> {
        let mmap = unsafe { MmapOptions::new().map(&self.file) }.map_err(Error::spill)?;

        #[cfg(unix)]
        {
            let _ = mmap.advise(memmap2::Advice::Sequential);
            #[cfg(target_os = "linux")]
            let _ = mmap.advise(memmap2::Advice::DontDump);
        }

        Ok(mmap)
    }
}
