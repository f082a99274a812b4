//! Gather/broadcast contract between workers and the coordinator.
//!
//! Workers hold disjoint index ranges of the configuration and
//! synchronize at exactly two points per update: the tag-remap broadcast
//! after the snapshot is taken, and the interaction gather before the
//! coordinator builds the graph. Transport is behind this trait; the
//! in-process implementations below are identity passes over the
//! workid-ordered values.

use std::ops::Range;

use gca_core::TagRemap;

use crate::detect::LocalInteractions;

pub trait Collective {
    fn world_size(&self) -> usize;

    /// Disjoint partition of `0..n` into one range per worker, in workid
    /// order. Ranges may be empty when there are more workers than
    /// particles.
    fn local_ranges(&self, n: usize) -> Vec<Range<usize>>;

    /// Make the coordinator's tag-remap table available to every worker.
    fn broadcast_tag_map(&self, map: &TagRemap) -> TagRemap {
        map.clone()
    }

    /// Collect every worker's local sets at the coordinator, in workid
    /// order.
    fn gather(&self, locals: Vec<LocalInteractions>) -> Vec<LocalInteractions> {
        locals
    }
}

/// Single worker holding the whole configuration; gather and broadcast
/// degenerate to identity passes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleWorker;

impl Collective for SingleWorker {
    fn world_size(&self) -> usize {
        1
    }

    fn local_ranges(&self, n: usize) -> Vec<Range<usize>> {
        vec![0..n]
    }
}

/// Contiguous partition into a fixed number of workers. Exercises the
/// multi-source aggregation path without external transport.
#[derive(Clone, Copy, Debug)]
pub struct SplitWorkers(pub usize);

impl Collective for SplitWorkers {
    fn world_size(&self) -> usize {
        self.0
    }

    fn local_ranges(&self, n: usize) -> Vec<Range<usize>> {
        let w = self.0.max(1);
        let base = n / w;
        let extra = n % w;
        let mut ranges = Vec::with_capacity(w);
        let mut start = 0;
        for workid in 0..w {
            let len = base + usize::from(workid < extra);
            ranges.push(start..start + len);
            start += len;
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_worker_owns_everything() {
        assert_eq!(SingleWorker.local_ranges(7), vec![0..7]);
    }

    #[test]
    fn split_ranges_partition_without_gaps() {
        let ranges = SplitWorkers(3).local_ranges(10);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
        let total: usize = ranges.iter().map(|r| r.len()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn more_workers_than_particles_yields_empty_ranges() {
        let ranges = SplitWorkers(4).local_ranges(2);
        assert_eq!(ranges, vec![0..1, 1..2, 2..2, 2..2]);
    }
}
