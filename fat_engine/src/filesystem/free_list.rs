//! Pool of free clusters, filled at mount time and drawn from when files grow.

use alloc::boxed::Box;
use alloc::collections::VecDeque;

use heapless::Deque;

use super::cluster::ClusterId;

/// Number of cluster numbers held by one segment.
pub const CLUSTERS_PER_SEGMENT: usize = 1024;

type Segment = Deque<ClusterId, CLUSTERS_PER_SEGMENT>;

/// FIFO of free cluster numbers.
///
/// Storage is a chain of fixed-capacity segments so growing the pool never
/// moves clusters that are already queued. New clusters go into the tail
/// segment, allocation drains the head segment, and a drained head segment
/// is dropped.
#[derive(Default)]
pub struct FreeClusterList {
    segments: VecDeque<Box<Segment>>,
    count: u32,
}

impl FreeClusterList {
    /// An empty pool.
    pub fn new() -> FreeClusterList {
        FreeClusterList {
            segments: VecDeque::new(),
            count: 0,
        }
    }

    /// Return a cluster to the pool.
    pub fn push(&mut self, mut cluster: ClusterId) {
        loop {
            if let Some(tail) = self.segments.back_mut() {
                match tail.push_back(cluster) {
                    Ok(()) => {
                        self.count += 1;
                        return;
                    }
                    Err(rejected) => cluster = rejected,
                }
            }
            self.segments.push_back(Box::new(Segment::new()));
        }
    }

    /// Take the oldest cluster out of the pool, or `None` when it is empty.
    pub fn pop(&mut self) -> Option<ClusterId> {
        let head = self.segments.front_mut()?;
        let cluster = head.pop_front();
        if head.is_empty() {
            self.segments.pop_front();
        }
        if cluster.is_some() {
            self.count -= 1;
        }
        cluster
    }

    /// Drop every segment. Safe to call on an empty pool.
    pub fn release(&mut self) {
        self.segments.clear();
        self.count = 0;
    }

    /// Number of clusters in the pool.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Is the pool empty?
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Does the pool hold `cluster`? Linear in the pool size.
    pub fn contains(&self, cluster: ClusterId) -> bool {
        self.iter().any(|c| c == cluster)
    }

    /// Walk the pool in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.segments.iter().flat_map(|s| s.iter().copied())
    }
}

impl core::fmt::Debug for FreeClusterList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FreeClusterList")
            .field("segments", &self.segments.len())
            .field("count", &self.count)
            .finish()
    }
}

// ****************************************************************************
//
// Unit Tests
//
// ****************************************************************************


// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
