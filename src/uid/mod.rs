//! User id admission filter
//!
//! Decides whether a resolved user id belongs to a real interactive account
//! and may therefore be disclosed to the router.

/// First id of the high range that is always admitted.
pub const HIGH_UID_MIN: u32 = 65537;

/// Inclusive range of user ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidRange {
    pub min: u32,
    pub max: u32,
}

impl UidRange {
    pub fn new(min: u32, max: u32) -> Self {
        UidRange { min, max }
    }

    /// Check if a uid is within this range (both bounds inclusive)
    pub fn contains(&self, uid: u32) -> bool {
        uid >= self.min && uid <= self.max
    }
}

/// Collection of admissible uid ranges.
///
/// Filled once at startup and only read while serving, so sessions share it
/// by reference without locking.
#[derive(Debug, Clone, Default)]
pub struct UidRanges {
    ranges: Vec<UidRange>,
}

impl UidRanges {
    pub fn new() -> Self {
        UidRanges { ranges: Vec::new() }
    }

    /// Ordinary user range plus the fixed high range.
    pub fn with_defaults(umin: u32, umax: u32) -> Self {
        let mut ranges = UidRanges::new();
        ranges.add_range(umin, umax);
        ranges.add_range(HIGH_UID_MIN, u32::MAX);
        ranges
    }

    /// Append a range. Overlaps and duplicates are kept as given.
    pub fn add_range(&mut self, min: u32, max: u32) {
        log::debug!("Admitting uids {}..={}", min, max);
        self.ranges.push(UidRange::new(min, max));
    }

    pub fn is_admissible(&self, uid: u32) -> bool {
        self.ranges.iter().any(|range| range.contains(uid))
    }

    pub fn ranges(&self) -> &[UidRange] {
        &self.ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_admits_nothing() {
        let ranges = UidRanges::new();
        assert!(!ranges.is_admissible(0));
        assert!(!ranges.is_admissible(1000));
        assert!(!ranges.is_admissible(u32::MAX));
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut ranges = UidRanges::new();
        ranges.add_range(1000, 2000);
        assert!(!ranges.is_admissible(999));
        assert!(ranges.is_admissible(1000));
        assert!(ranges.is_admissible(2000));
        assert!(!ranges.is_admissible(2001));
    }

    #[test]
    fn overlapping_ranges_are_a_plain_union() {
        let mut ranges = UidRanges::new();
        ranges.add_range(10, 20);
        ranges.add_range(15, 30);
        ranges.add_range(15, 30);
        assert_eq!(ranges.ranges().len(), 3);
        for uid in 10..=30 {
            assert!(ranges.is_admissible(uid), "uid {uid}");
        }
        assert!(!ranges.is_admissible(9));
        assert!(!ranges.is_admissible(31));
    }

    #[test]
    fn default_ranges_skip_system_accounts_and_nobody_gap() {
        let ranges = UidRanges::with_defaults(1000, 65533);
        assert!(!ranges.is_admissible(0));
        assert!(!ranges.is_admissible(33));
        assert!(!ranges.is_admissible(500));
        assert!(ranges.is_admissible(1000));
        assert!(ranges.is_admissible(65533));
        assert!(!ranges.is_admissible(65534));
        assert!(!ranges.is_admissible(65536));
        assert!(ranges.is_admissible(65537));
        assert!(ranges.is_admissible(70000));
        assert!(ranges.is_admissible(u32::MAX));
    }

    #[test]
    fn single_uid_range() {
        let mut ranges = UidRanges::new();
        ranges.add_range(42, 42);
        assert!(ranges.is_admissible(42));
        assert!(!ranges.is_admissible(41));
        assert!(!ranges.is_admissible(43));
    }
}
