//! Chunk boundaries and remote naming.

use std::ops::Range;

/// Layout of one split: byte ranges plus the keys they are published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    len: usize,
    chunk_count: usize,
    chunk_size: usize,
    /// Remote directory with trailing `/`, empty at the store root.
    remote_dir: String,
    /// Remote file name without its extension.
    name: String,
}

impl SplitPlan {
    /// `chunk_count` must be at least 1; callers pass the effective count.
    pub fn new(len: usize, chunk_count: usize, remote_path: &str) -> Self {
        let chunk_count = chunk_count.max(1);
        let (remote_dir, file) = match remote_path.rfind('/') {
            Some(idx) => (&remote_path[..=idx], &remote_path[idx + 1..]),
            None => ("", remote_path),
        };
        let name = match file.rfind('.') {
            Some(dot) if dot > 0 => &file[..dot],
            _ => file,
        };

        Self {
            len,
            chunk_count,
            chunk_size: len.div_ceil(chunk_count),
            remote_dir: remote_dir.to_string(),
            name: name.to_string(),
        }
    }

    pub const fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Byte range of chunk `index` (0-based); trailing chunks may be empty.
    pub fn range(&self, index: usize) -> Range<usize> {
        let start = (index * self.chunk_size).min(self.len);
        let end = (start + self.chunk_size).min(self.len);
        start..end
    }

    /// File name of chunk `ordinal` (1-based).
    pub fn chunk_file(&self, ordinal: usize) -> String {
        format!("{}_chunk{ordinal}.js", self.name)
    }

    pub fn loader_file(&self) -> String {
        format!("{}_loader.js", self.name)
    }

    pub fn chunk_key(&self, ordinal: usize) -> String {
        format!("{}{}", self.remote_dir, self.chunk_file(ordinal))
    }

    pub fn loader_key(&self) -> String {
        format!("{}{}", self.remote_dir, self.loader_file())
    }

    /// Chunk keys in load order.
    pub fn chunk_keys(&self) -> Vec<String> {
        (1..=self.chunk_count).map(|i| self.chunk_key(i)).collect()
    }
}
