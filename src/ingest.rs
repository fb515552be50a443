// This file loads the season's match list from the JSON file the scraper (or a human) produces,
// validates every record before anything is enumerated, and writes the same format back out.
//
// File format, one object per fixture:
//   { "teams": ["G2", "FNC"], "week": 3, "result": [1, 0] }
// An unplayed fixture has "result": [] (or null, or no result key at all).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{LeagueError, Result};
use crate::fixture::{Match, MatchResult};

/// Raw record as stored on disk. Fields are deliberately loose so bad values
/// reach validation and get reported with their index instead of a bare parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub teams: Vec<String>,
    pub week: i64,
    #[serde(default)]
    pub result: Option<Vec<i64>>,
}

impl MatchRecord {
    pub fn into_match(self, index: usize) -> Result<Match> {
        let malformed = |reason: String| LeagueError::MalformedMatch { index, reason };

        if self.teams.len() != 2 {
            return Err(malformed(format!("expected 2 teams, found {}", self.teams.len())));
        }
        let team_a = self.teams[0].trim();
        let team_b = self.teams[1].trim();
        if team_a.is_empty() || team_b.is_empty() {
            return Err(malformed("team name is empty".to_string()));
        }
        if team_a == team_b {
            return Err(malformed(format!("{} cannot play itself", team_a)));
        }
        if self.week < 1 || self.week > u32::MAX as i64 {
            return Err(malformed(format!("invalid week {}", self.week)));
        }

        let result = match self.result.as_deref() {
            None | Some([]) => None,
            Some([a, b]) => {
                if *a < 0 || *b < 0 || *a > u32::MAX as i64 || *b > u32::MAX as i64 {
                    return Err(malformed(format!("invalid score {}-{}", a, b)));
                }
                if a == b {
                    return Err(malformed(format!("drawn result {}-{} is not supported", a, b)));
                }
                Some(MatchResult::new(*a as u32, *b as u32))
            }
            Some(other) => {
                return Err(malformed(format!("expected 0 or 2 scores, found {}", other.len())));
            }
        };

        Ok(Match {
            teams: (team_a.to_string(), team_b.to_string()),
            week: self.week as u32,
            result,
        })
    }
}

impl From<&Match> for MatchRecord {
    fn from(m: &Match) -> Self {
        MatchRecord {
            teams: vec![m.teams.0.clone(), m.teams.1.clone()],
            week: m.week as i64,
            result: Some(
                m.result
                    .map(|r| vec![r.score_a as i64, r.score_b as i64])
                    .unwrap_or_default(),
            ),
        }
    }
}

/// Check matches built in code the same way file records are checked.
pub fn validate_matches(matches: &[Match]) -> Result<()> {
    for (index, m) in matches.iter().enumerate() {
        MatchRecord::from(m).into_match(index)?;
    }
    Ok(())
}

pub fn parse_matches(json: &str) -> Result<Vec<Match>> {
    let records: Vec<MatchRecord> = serde_json::from_str(json)?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_match(index))
        .collect()
}

pub fn load_matches(path: &Path) -> Result<Vec<Match>> {
    log::debug!("Loading matches from '{}'", path.display());
    let content = fs::read_to_string(path)?;
    let matches = parse_matches(&content)?;
    log::info!("Loaded {} matches from '{}'", matches.len(), path.display());
    Ok(matches)
}

pub fn matches_to_json(matches: &[Match]) -> Result<String> {
    let records: Vec<MatchRecord> = matches.iter().map(MatchRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

pub fn save_matches(path: &Path, matches: &[Match]) -> Result<()> {
    let json = matches_to_json(matches)?;
    fs::write(path, json)?;
    log::info!("Saved {} matches to '{}'", matches.len(), path.display());
    Ok(())
}

/// Split into (finished, unfinished), both in input order.
pub fn partition(matches: &[Match]) -> (Vec<Match>, Vec<Match>) {
    matches.iter().cloned().partition(|m| m.is_played())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"teams": ["G2", "FNC"], "week": 1, "result": [1, 0]},
        {"teams": ["MAD", "RGE"], "week": 1, "result": [0, 1]},
        {"teams": ["G2", "MAD"], "week": 5, "result": []},
        {"teams": ["FNC", "RGE"], "week": 5, "result": null},
        {"teams": ["RGE", "G2"], "week": 6}
    ]"#;

    fn malformed_index(json: &str) -> Option<usize> {
        match parse_matches(json) {
            Err(LeagueError::MalformedMatch { index, .. }) => Some(index),
            _ => None,
        }
    }

    #[test]
    fn test_parse_sample() {
        let matches = parse_matches(SAMPLE).unwrap();
        assert_eq!(matches.len(), 5);
        assert_eq!(matches[0].winner(), Some("G2"));
        assert_eq!(matches[1].winner(), Some("RGE"));
        assert!(matches[2..].iter().all(|m| !m.is_played()));
    }

    #[test]
    fn test_partition_keeps_order() {
        let matches = parse_matches(SAMPLE).unwrap();
        let (finished, unfinished) = partition(&matches);
        assert_eq!(finished.len(), 2);
        assert_eq!(unfinished.len(), 3);
        assert_eq!(unfinished[0].teams.0, "G2");
        assert_eq!(unfinished[2].teams.0, "RGE");
    }

    #[test]
    fn test_rejects_malformed_records() {
        assert_eq!(malformed_index(r#"[{"teams": ["A"], "week": 1}]"#), Some(0));
        assert_eq!(
            malformed_index(r#"[{"teams": ["A", "B"], "week": 1}, {"teams": ["A", "A"], "week": 1}]"#),
            Some(1)
        );
        assert_eq!(malformed_index(r#"[{"teams": ["A", " "], "week": 1}]"#), Some(0));
        assert_eq!(malformed_index(r#"[{"teams": ["A", "B"], "week": 0}]"#), Some(0));
        assert_eq!(malformed_index(r#"[{"teams": ["A", "B"], "week": 1, "result": [1]}]"#), Some(0));
        assert_eq!(malformed_index(r#"[{"teams": ["A", "B"], "week": 1, "result": [2, 2]}]"#), Some(0));
        assert_eq!(malformed_index(r#"[{"teams": ["A", "B"], "week": 1, "result": [-1, 0]}]"#), Some(0));
    }

    #[test]
    fn test_missing_teams_key_is_json_error() {
        let err = parse_matches(r#"[{"week": 1}]"#).unwrap_err();
        assert!(matches!(err, LeagueError::Json(_)));
    }

    #[test]
    fn test_round_trip_preserves_partition() {
        let matches = parse_matches(SAMPLE).unwrap();
        let json = matches_to_json(&matches).unwrap();
        let reloaded = parse_matches(&json).unwrap();
        assert_eq!(matches, reloaded);
        assert_eq!(partition(&matches), partition(&reloaded));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("leagueprobs_ingest_{}.json", std::process::id()));
        let matches = parse_matches(SAMPLE).unwrap();
        save_matches(&path, &matches).unwrap();
        let loaded = load_matches(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(matches, loaded);
    }

    #[test]
    fn test_validate_matches_built_in_code() {
        assert!(validate_matches(&[Match::new("A", "B", 1)]).is_ok());
        let err = validate_matches(&[Match::new("A", "B", 1), Match::new("C", "C", 2)]).unwrap_err();
        assert!(matches!(err, LeagueError::MalformedMatch { index: 1, .. }));
        assert!(validate_matches(&[Match::played("A", "B", 1, 3, 3)]).is_err());
    }
}
