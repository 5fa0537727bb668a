//! Unique assembly labels for comparisons and call return points.
//!
//! Generated labels take the form `STEM$n`. VM symbols cannot contain `$`
//! and user labels are emitted as `function$label` where `label` never starts
//! with a digit, so no VM program can spell one of these.

/// Monotonic label source shared by every source unit of a run.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    next: usize,
}

/// Label pair used by the comparison idiom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchLabels {
    pub taken: String,
    pub end: String,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn allocate(&mut self, stem: &str) -> String {
        format!("{}${}", stem, self.next_id())
    }

    /// `TRUE$n` and `END$n` sharing a single id.
    pub fn allocate_branch(&mut self) -> BranchLabels {
        let id = self.next_id();
        BranchLabels {
            taken: format!("TRUE${}", id),
            end: format!("END${}", id),
        }
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> usize {
        self.next
    }
}
