// Rank -> bucket mapping for one league.
// After construction the only mutation is `set_standing` (directly or through a batch of moves),
// and every call keeps the buckets a partition of the team names.

use serde::Serialize;
use std::collections::BTreeMap;

pub type Rank = u32;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Standings {
    buckets: BTreeMap<Rank, Vec<String>>,
}

/// A pending relocation of one team, produced by a tiebreak pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub team: String,
    pub rank: Rank,
}

/// Frozen copy of the standings a tiebreak pass reads from while its moves are collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsSnapshot {
    buckets: Vec<(Rank, Vec<String>)>,
}

impl StandingsSnapshot {
    pub fn buckets(&self) -> impl Iterator<Item = (Rank, &[String])> {
        self.buckets.iter().map(|(rank, teams)| (*rank, teams.as_slice()))
    }

    /// Buckets holding more than one team
    pub fn tied_buckets(&self) -> impl Iterator<Item = (Rank, &[String])> {
        self.buckets().filter(|(_, teams)| teams.len() > 1)
    }
}

impl Standings {
    pub fn new() -> Standings {
        Standings {
            buckets: BTreeMap::new(),
        }
    }

    /// Build standings from already-grouped buckets in table order.
    /// Each bucket gets the rank "teams strictly above + 1", so shared records give 1, 1, 3.
    pub fn from_groups(groups: Vec<Vec<String>>) -> Standings {
        let mut buckets = BTreeMap::new();
        let mut next_rank: Rank = 1;
        for group in groups.into_iter().filter(|g| !g.is_empty()) {
            let size = group.len() as Rank;
            buckets.insert(next_rank, group);
            next_rank += size;
        }
        Standings { buckets }
    }

    pub fn get(&self, rank: Rank) -> Option<&[String]> {
        self.buckets.get(&rank).map(|teams| teams.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rank, &[String])> {
        self.buckets.iter().map(|(rank, teams)| (*rank, teams.as_slice()))
    }

    pub fn rank_of(&self, team: &str) -> Option<Rank> {
        self.buckets
            .iter()
            .find(|(_, teams)| teams.iter().any(|t| t == team))
            .map(|(rank, _)| *rank)
    }

    pub fn team_count(&self) -> usize {
        self.buckets.values().map(|teams| teams.len()).sum()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn has_ties(&self) -> bool {
        self.buckets.values().any(|teams| teams.len() > 1)
    }

    /// Remove `team` from its current bucket (dropping the bucket if it empties)
    /// and append it to the bucket at `rank`.
    pub fn set_standing(&mut self, team: &str, rank: Rank) {
        let current = self.rank_of(team);
        if let Some(current) = current {
            if let Some(teams) = self.buckets.get_mut(&current) {
                teams.retain(|t| t != team);
                if teams.is_empty() {
                    self.buckets.remove(&current);
                }
            }
        }
        self.buckets.entry(rank).or_default().push(team.to_string());
    }

    /// Apply a batch of moves in order.
    pub fn apply(&mut self, moves: &[Move]) {
        for m in moves {
            log::trace!("Moving {} to rank {}", m.team, m.rank);
            self.set_standing(&m.team, m.rank);
        }
    }

    pub fn snapshot(&self) -> StandingsSnapshot {
        StandingsSnapshot {
            buckets: self
                .buckets
                .iter()
                .map(|(rank, teams)| (*rank, teams.clone()))
                .collect(),
        }
    }

    /// True when every name appears in exactly one bucket and no other names are present.
    pub fn is_partition_of<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        let mut expected: Vec<&str> = names.into_iter().collect();
        let mut present: Vec<&str> = self
            .buckets
            .values()
            .flat_map(|teams| teams.iter().map(|t| t.as_str()))
            .collect();
        expected.sort_unstable();
        present.sort_unstable();
        expected == present
    }

    pub fn into_map(self) -> BTreeMap<Rank, Vec<String>> {
        self.buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_groups_skips_shared_ranks() {
        let standings = Standings::from_groups(vec![names(&["A", "B"]), names(&["C"]), names(&["D", "E", "F"]), names(&["G"])]);
        assert_eq!(standings.get(1), Some(&names(&["A", "B"])[..]));
        assert_eq!(standings.get(2), None);
        assert_eq!(standings.get(3), Some(&names(&["C"])[..]));
        assert_eq!(standings.get(4), Some(&names(&["D", "E", "F"])[..]));
        assert_eq!(standings.get(7), Some(&names(&["G"])[..]));
        assert_eq!(standings.team_count(), 7);
    }

    #[test]
    fn test_set_standing_keeps_partition() {
        let mut standings = Standings::from_groups(vec![names(&["A", "B", "C"]), names(&["D"])]);
        standings.set_standing("B", 2);
        assert_eq!(standings.get(1), Some(&names(&["A", "C"])[..]));
        assert_eq!(standings.get(2), Some(&names(&["B"])[..]));
        assert!(standings.is_partition_of(["A", "B", "C", "D"]));

        // Moving the last team out of a bucket deletes it
        standings.set_standing("D", 3);
        assert_eq!(standings.get(4), None);
        assert_eq!(standings.get(3), Some(&names(&["D"])[..]));
        assert!(standings.is_partition_of(["A", "B", "C", "D"]));
    }

    #[test]
    fn test_set_standing_appends_to_existing_bucket() {
        let mut standings = Standings::from_groups(vec![names(&["A"]), names(&["B"]), names(&["C"])]);
        standings.set_standing("C", 2);
        assert_eq!(standings.get(2), Some(&names(&["B", "C"])[..]));
        assert_eq!(standings.bucket_count(), 2);
    }

    #[test]
    fn test_set_standing_same_rank_is_stable() {
        let mut standings = Standings::from_groups(vec![names(&["A"]), names(&["B"])]);
        standings.set_standing("A", 1);
        assert_eq!(standings.get(1), Some(&names(&["A"])[..]));
        assert!(standings.is_partition_of(["A", "B"]));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut standings = Standings::from_groups(vec![names(&["A", "B"]), names(&["C"])]);
        let snapshot = standings.snapshot();
        standings.apply(&[Move { team: "B".to_string(), rank: 2 }]);
        let tied: Vec<(Rank, Vec<String>)> = snapshot.tied_buckets().map(|(r, t)| (r, t.to_vec())).collect();
        assert_eq!(tied, vec![(1, names(&["A", "B"]))]);
        assert!(!standings.has_ties());
    }

    #[test]
    fn test_is_partition_detects_missing_and_duplicates() {
        let standings = Standings::from_groups(vec![names(&["A"]), names(&["B"])]);
        assert!(!standings.is_partition_of(["A", "B", "C"]));
        assert!(!standings.is_partition_of(["A"]));
        let dup = Standings::from_groups(vec![names(&["A"]), names(&["A", "B"])]);
        assert!(!dup.is_partition_of(["A", "B"]));
    }
}
