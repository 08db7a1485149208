//! Fixed level tables for the two upgrade tracks.
//!
//! The tables are backend constants, not configuration: a level missing from
//! a cost table is unpurchasable no matter how large the balance is.

/// The two purchasable progression lines. Auxiliary upgrades appear in
/// profile snapshots but have no purchase endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpgradeTrack {
    Speed,
    Storage,
}

/// Window used when the storage level is 0 or has no table entry.
pub const FALLBACK_WINDOW_HOURS: u64 = 2;

/// Claim-window length in hours by storage level.
const STORAGE_WINDOW_HOURS: &[(u32, u64)] = &[(1, 3), (2, 4), (3, 6), (4, 12), (5, 24)];

/// Upgrade price in coins by target level, per track.
const SPEED_COSTS: &[(u32, f64)] = &[(1, 0.4), (2, 2.0), (3, 4.0), (4, 10.0), (5, 30.0)];
const STORAGE_COSTS: &[(u32, f64)] = &[(1, 0.4), (2, 1.0), (3, 2.0), (4, 8.0), (5, 16.0)];

/// Hours the storage holds before accumulated resources stop growing.
pub fn storage_window_hours(storage_level: u32) -> u64 {
    lookup(STORAGE_WINDOW_HOURS, storage_level).unwrap_or(FALLBACK_WINDOW_HOURS)
}

/// Price of buying `level` on the given track, `None` when that level is not
/// purchasable.
pub fn upgrade_cost(track: UpgradeTrack, level: u32) -> Option<f64> {
    let table = match track {
        UpgradeTrack::Speed => SPEED_COSTS,
        UpgradeTrack::Storage => STORAGE_COSTS,
    };
    lookup(table, level)
}

fn lookup<T: Copy>(table: &[(u32, T)], level: u32) -> Option<T> {
    table
        .iter()
        .find(|(entry, _)| *entry == level)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_window_grows_with_level() {
        assert_eq!(storage_window_hours(1), 3);
        assert_eq!(storage_window_hours(3), 6);
        assert_eq!(storage_window_hours(5), 24);
    }

    #[test]
    fn storage_window_falls_back_for_level_zero_and_unknown_levels() {
        assert_eq!(storage_window_hours(0), FALLBACK_WINDOW_HOURS);
        assert_eq!(storage_window_hours(9), FALLBACK_WINDOW_HOURS);
    }

    #[test]
    fn cost_tables_are_independent_per_track() {
        assert_eq!(upgrade_cost(UpgradeTrack::Speed, 2), Some(2.0));
        assert_eq!(upgrade_cost(UpgradeTrack::Storage, 2), Some(1.0));
    }

    #[test]
    fn levels_outside_the_table_are_unpurchasable() {
        assert_eq!(upgrade_cost(UpgradeTrack::Speed, 0), None);
        assert_eq!(upgrade_cost(UpgradeTrack::Speed, 6), None);
        assert_eq!(upgrade_cost(UpgradeTrack::Storage, 6), None);
    }
}
