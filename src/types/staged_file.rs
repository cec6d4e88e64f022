use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ProvenanceId(pub u64);

impl fmt::Display for ProvenanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out ids in allocation order; one allocator per run.
#[derive(Debug, Default)]
pub struct ProvenanceIdAllocator {
    next: u64,
}

impl ProvenanceIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> ProvenanceId {
        let id = ProvenanceId(self.next);
        self.next += 1;
        id
    }
}

/// A plain text file sitting in the staging directory.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub file_name: String,
}

/// A staged file after it has been appended to the result file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MergedFile {
    pub file_name: String,
    pub provenance_id: ProvenanceId,
    pub lines_written: usize,
    pub lines_dropped: usize,
}
