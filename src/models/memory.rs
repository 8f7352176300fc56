use chrono::{DateTime, Local};

/// One complete set of memory and swap measurements, in kilobytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MemSnapshot {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_buffers: u64,
    pub mem_cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,

    pub mem_used: u64,
    pub swap_used: u64,
}

impl MemSnapshot {
    /// Builds a snapshot and derives the used fields.
    ///
    /// A free count larger than its total (a torn read) clamps the used
    /// count to zero.
    pub fn new(
        mem_total: u64,
        mem_free: u64,
        mem_buffers: u64,
        mem_cached: u64,
        swap_total: u64,
        swap_free: u64,
    ) -> Self {
        Self {
            mem_total,
            mem_free,
            mem_buffers,
            mem_cached,
            swap_total,
            swap_free,
            mem_used: mem_total.saturating_sub(mem_free),
            swap_used: swap_total.saturating_sub(swap_free),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.mem_free <= self.mem_total && self.swap_free <= self.swap_total
    }

    /// Free memory, either as reported or counting buffers and page cache as free.
    pub fn available(&self, standard_free: bool) -> u64 {
        if standard_free {
            self.mem_free
        } else {
            self.mem_free
                .saturating_add(self.mem_buffers)
                .saturating_add(self.mem_cached)
        }
    }

    /// Used memory excluding buffers and page cache.
    pub fn program_used(&self) -> u64 {
        self.mem_used
            .saturating_sub(self.mem_buffers)
            .saturating_sub(self.mem_cached)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Uninitialized,
    Tracking,
}

#[derive(Debug, Clone)]
pub struct ChangeResult {
    pub changed: bool,
    pub snapshot: MemSnapshot,
    pub sampled_at: DateTime<Local>,
}
