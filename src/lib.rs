//! Exact playoff probabilities for the remainder of a league split.
//!
//! Every unplayed match is enumerated as a win for either side, each resulting season is
//! ranked with the league's tiebreak rules, and the final ranks are counted per team.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fixture;
pub mod ingest;
pub mod league;
pub mod possibility;
pub mod report;
pub mod standings;
pub mod team;
pub mod tiebreak;

#[cfg(test)]
pub(crate) mod testutil;

pub use aggregate::Aggregate;
pub use config::Config;
pub use error::{LeagueError, Result, ScenarioError};
pub use fixture::{Match, MatchResult};
pub use league::{League, LeagueId, RuleSet};
pub use possibility::{CancelToken, PossibilityEngine, RunSummary};
pub use report::{Report, ReportFormat};
pub use standings::{Rank, Standings};
pub use tiebreak::TiebreakRule;
