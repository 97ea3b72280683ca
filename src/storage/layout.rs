use std::path::{Path, PathBuf};

/// File names of one segment under its base directory.
#[derive(Debug, Clone)]
pub struct SegmentLayout {
    pub base_dir: PathBuf,
}

impl SegmentLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        SegmentLayout {
            base_dir: base_dir.into(),
        }
    }

    /// Posting lists while the commit is in flight; renamed to
    /// [`SegmentLayout::index_path`] once fsynced.
    pub fn staged_index_path(&self) -> PathBuf {
        self.base_dir.join("index.t")
    }

    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join("index")
    }

    /// Packed bitmap of replaced/deleted documents. Absent when the
    /// session masked nothing.
    pub fn updated_documents_path(&self) -> PathBuf {
        self.base_dir.join("updated_documents.ids")
    }

    /// Codec identifier + segment statistics.
    pub fn id_path(&self) -> PathBuf {
        self.base_dir.join("id")
    }
}

impl From<&Path> for SegmentLayout {
    fn from(base_dir: &Path) -> Self {
        SegmentLayout::new(base_dir)
    }
}
