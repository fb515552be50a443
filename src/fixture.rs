// This module defines a single fixture between two teams and its (optional) result.
// A hypothesised scenario fills the result of every unplayed fixture exactly once.

use std::fmt;

/// Final score of a played match, in the same order as `Match::teams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchResult {
    pub score_a: u32,
    pub score_b: u32,
}

impl MatchResult {
    pub fn new(score_a: u32, score_b: u32) -> Self {
        MatchResult { score_a, score_b }
    }

    /// Result used for a hypothesised outcome: `true` means the first listed team wins.
    pub fn from_outcome(first_team_wins: bool) -> Self {
        if first_team_wins {
            MatchResult::new(1, 0)
        } else {
            MatchResult::new(0, 1)
        }
    }

    pub fn first_team_won(&self) -> bool {
        self.score_a > self.score_b
    }
}

/// One fixture of the season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub teams: (String, String),
    pub week: u32,
    pub result: Option<MatchResult>,
}

impl Match {
    pub fn new(team_a: &str, team_b: &str, week: u32) -> Self {
        Match {
            teams: (team_a.to_string(), team_b.to_string()),
            week,
            result: None,
        }
    }

    pub fn played(team_a: &str, team_b: &str, week: u32, score_a: u32, score_b: u32) -> Self {
        Match {
            teams: (team_a.to_string(), team_b.to_string()),
            week,
            result: Some(MatchResult::new(score_a, score_b)),
        }
    }

    pub fn is_played(&self) -> bool {
        self.result.is_some()
    }

    /// Returns the winning team's name, None while unplayed
    pub fn winner(&self) -> Option<&str> {
        self.result.map(|r| {
            if r.first_team_won() {
                self.teams.0.as_str()
            } else {
                self.teams.1.as_str()
            }
        })
    }

    /// Returns the losing team's name, None while unplayed
    pub fn loser(&self) -> Option<&str> {
        self.result.map(|r| {
            if r.first_team_won() {
                self.teams.1.as_str()
            } else {
                self.teams.0.as_str()
            }
        })
    }

    pub fn involves(&self, team: &str) -> bool {
        self.teams.0 == team || self.teams.1 == team
    }

    /// The other side of this fixture, if `team` plays in it
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.teams.0 == team {
            Some(self.teams.1.as_str())
        } else if self.teams.1 == team {
            Some(self.teams.0.as_str())
        } else {
            None
        }
    }

    /// Copy of this fixture with a hypothesised winner assigned.
    pub fn with_outcome(&self, first_team_wins: bool) -> Match {
        Match {
            teams: self.teams.clone(),
            week: self.week,
            result: Some(MatchResult::from_outcome(first_team_wins)),
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            Some(r) => write!(
                f,
                "Week {}: {} ({} - {}) {}",
                self.week, self.teams.0, r.score_a, r.score_b, self.teams.1
            ),
            None => write!(f, "Week {}: {} ? - ? {}", self.week, self.teams.0, self.teams.1),
        }
    }
}
