// Cumulative per-team, per-rank occurrence counts across every scenario of a run.
// Counting is plain integer addition, so the order scenarios arrive in never matters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::standings::{Rank, Standings};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    counts: BTreeMap<String, BTreeMap<Rank, u64>>,
}

impl Aggregate {
    /// Start an aggregate with an empty row for every team, so teams that never
    /// got counted still show up in reports.
    pub fn new<'a>(teams: impl IntoIterator<Item = &'a str>) -> Aggregate {
        Aggregate {
            counts: teams
                .into_iter()
                .map(|name| (name.to_string(), BTreeMap::new()))
                .collect(),
        }
    }

    pub fn increment(&mut self, team: &str, rank: Rank) {
        *self
            .counts
            .entry(team.to_string())
            .or_default()
            .entry(rank)
            .or_insert(0) += 1;
    }

    /// Count every team of one resolved scenario at its bucket's rank.
    pub fn record(&mut self, standings: &Standings) {
        for (rank, teams) in standings.iter() {
            for team in teams {
                self.increment(team, rank);
            }
        }
    }

    pub fn merge(&mut self, other: &Aggregate) {
        for (team, ranks) in &other.counts {
            let row = self.counts.entry(team.clone()).or_default();
            for (rank, count) in ranks {
                *row.entry(*rank).or_insert(0) += count;
            }
        }
    }

    pub fn count(&self, team: &str, rank: Rank) -> u64 {
        self.counts
            .get(team)
            .and_then(|ranks| ranks.get(&rank))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_for(&self, team: &str) -> u64 {
        self.counts
            .get(team)
            .map(|ranks| ranks.values().sum())
            .unwrap_or(0)
    }

    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(|name| name.as_str())
    }

    pub fn team_count(&self) -> usize {
        self.counts.len()
    }

    pub fn ranks_of(&self, team: &str) -> Option<&BTreeMap<Rank, u64>> {
        self.counts.get(team)
    }

    /// Counts for ranks 1..=`ranks`, zero-filled.
    pub fn count_vector(&self, team: &str, ranks: usize) -> Vec<u64> {
        (1..=ranks as Rank).map(|rank| self.count(team, rank)).collect()
    }

    /// Teams whose total differs from `expected`, with how many scenarios they are missing.
    pub fn shortfalls(&self, expected: u64) -> Vec<(String, u64)> {
        self.counts
            .keys()
            .filter_map(|team| {
                let total = self.total_for(team);
                (total != expected).then(|| (team.clone(), expected.saturating_sub(total)))
            })
            .collect()
    }

    pub fn is_complete(&self, expected: u64) -> bool {
        self.shortfalls(expected).is_empty()
    }

    /// Share of a team's counted scenarios at `rank`, in percent.
    pub fn percentage(&self, team: &str, rank: Rank) -> f64 {
        let total = self.total_for(team);
        if total == 0 {
            return 0.0;
        }
        self.count(team, rank) as f64 / total as f64 * 100.0
    }

    /// Percent of scenarios in which the team finishes at rank `slots` or better.
    pub fn playoff_percentage(&self, team: &str, slots: usize) -> f64 {
        (1..=slots as Rank).map(|rank| self.percentage(team, rank)).sum()
    }

    pub fn into_map(self) -> BTreeMap<String, BTreeMap<Rank, u64>> {
        self.counts
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.counts)?)
    }

    pub fn from_json(json: &str) -> Result<Aggregate> {
        let counts = serde_json::from_str(json)?;
        Ok(Aggregate { counts })
    }

    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        log::info!("Aggregate written to '{}'", path.display());
        Ok(())
    }
}
