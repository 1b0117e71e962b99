//! Splitting completed pages into numbered output chunks

use crate::state::Page;

/// One output file's worth of pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    /// 1-based part number
    pub part: usize,

    /// Total number of parts in this output
    pub total: usize,

    /// Pages in discovery order; never more than `pages_per_file`
    pub pages: Vec<Page>,
}

impl OutputChunk {
    /// 1-based position of the first page across the whole output
    pub fn first_page_number(&self, pages_per_file: usize) -> usize {
        (self.part - 1) * pages_per_file + 1
    }
}

/// Sorts pages by discovery index and splits them into chunks of at most
/// `pages_per_file`
///
/// Zero pages yield zero chunks. Chunking is by page count only; a chunk of
/// long pages can be much larger than a chunk of short ones.
pub fn assemble(mut pages: Vec<Page>, pages_per_file: usize) -> Vec<OutputChunk> {
    let per_file = pages_per_file.max(1);
    pages.sort_by_key(|p| p.discovery_index);

    let total = pages.len().div_ceil(per_file);
    let mut chunks = Vec::with_capacity(total);
    let mut pages = pages.into_iter().peekable();
    let mut part = 1;
    while pages.peek().is_some() {
        chunks.push(OutputChunk {
            part,
            total,
            pages: pages.by_ref().take(per_file).collect(),
        });
        part += 1;
    }
    chunks
}
