//! Per-block dependency depth tracking.

use rustc_hash::FxHashMap;

use crate::location::Location;

/// Depth of the most recent writer of each location within one block.
///
/// A location absent from the map has never been written in this block and
/// reads as depth 0: every block starts as if all inputs were ready.
#[derive(Clone, Debug, Default)]
pub struct DependencyTracker {
    depths: FxHashMap<Location, u32>,
}

impl DependencyTracker {
    /// Create a new tracker with no writes recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum recorded depth among `locations`, or 0 if none was written.
    pub fn max_depth_of<'a>(&self, locations: impl IntoIterator<Item = &'a Location>) -> u32 {
        locations
            .into_iter()
            .filter_map(|loc| self.depths.get(loc))
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Set each location's depth, replacing any earlier writer.
    pub fn record_write<'a>(&mut self, locations: impl IntoIterator<Item = &'a Location>, depth: u32) {
        for loc in locations {
            self.depths.insert(*loc, depth);
        }
    }

    /// Depth recorded for a single location.
    pub fn depth_of(&self, location: &Location) -> Option<u32> {
        self.depths.get(location).copied()
    }

    /// Number of distinct locations written so far.
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilp_ir::{Flag, RegFamily};

    #[test]
    fn test_unwritten_locations_read_as_zero() {
        let tracker = DependencyTracker::new();
        let locs = [Location::Register(RegFamily::Gpr(0)), Location::Flag(Flag::Zero)];
        assert_eq!(tracker.max_depth_of(&locs), 0);
        assert_eq!(tracker.max_depth_of(&[] as &[Location]), 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_max_over_written_locations() {
        let mut tracker = DependencyTracker::new();
        let rax = Location::Register(RegFamily::Gpr(0));
        let rcx = Location::Register(RegFamily::Gpr(1));
        let zf = Location::Flag(Flag::Zero);

        tracker.record_write(&[rax], 3);
        tracker.record_write(&[rcx, zf], 1);
        assert_eq!(tracker.max_depth_of(&[rcx, zf]), 1);
        assert_eq!(tracker.max_depth_of(&[rcx, rax]), 3);
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_later_write_replaces_earlier() {
        let mut tracker = DependencyTracker::new();
        let rax = Location::Register(RegFamily::Gpr(0));
        tracker.record_write(&[rax], 5);
        tracker.record_write(&[rax], 1);
        assert_eq!(tracker.depth_of(&rax), Some(1));
    }
}
