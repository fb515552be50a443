// A team owns every fixture it plays in for one scenario.
// All counts are derived on demand from those fixtures; nothing is cached.

use crate::fixture::Match;

/// Wins first, losses second.
pub type Record = (u32, u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub matches: Vec<Match>,
}

impl Team {
    pub fn new(name: &str) -> Team {
        Team {
            name: name.to_string(),
            matches: Vec::new(),
        }
    }

    pub fn with_matches(name: &str, matches: Vec<Match>) -> Team {
        Team {
            name: name.to_string(),
            matches,
        }
    }

    pub fn wins(&self) -> u32 {
        self.matches
            .iter()
            .filter(|m| m.winner() == Some(self.name.as_str()))
            .count() as u32
    }

    pub fn losses(&self) -> u32 {
        self.matches
            .iter()
            .filter(|m| m.loser() == Some(self.name.as_str()))
            .count() as u32
    }

    pub fn record(&self) -> Record {
        (self.wins(), self.losses())
    }

    /// Wins restricted to fixtures against `others`.
    /// Only used among currently tied teams, so `others` is a bucket, not the full schedule.
    pub fn head_to_head_wins(&self, others: &[&str]) -> u32 {
        self.matches
            .iter()
            .filter(|m| m.winner() == Some(self.name.as_str()))
            .filter(|m| {
                m.opponent_of(&self.name)
                    .map_or(false, |opponent| opponent != self.name && others.contains(&opponent))
            })
            .count() as u32
    }

    /// Wins in weeks strictly after `split_week`.
    pub fn wins_in_second_half(&self, split_week: u32) -> u32 {
        self.matches
            .iter()
            .filter(|m| m.week > split_week)
            .filter(|m| m.winner() == Some(self.name.as_str()))
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_team() -> Team {
        Team::with_matches(
            "A",
            vec![
                Match::played("A", "B", 1, 1, 0),
                Match::played("C", "A", 2, 1, 0),
                Match::played("A", "D", 5, 1, 0),
                Match::played("B", "A", 6, 0, 1),
                Match::new("A", "C", 7),
            ],
        )
    }

    #[test]
    fn test_record_ignores_unplayed() {
        let team = sample_team();
        assert_eq!(team.wins(), 3);
        assert_eq!(team.losses(), 1);
        assert_eq!(team.record(), (3, 1));
    }

    #[test]
    fn test_head_to_head_wins() {
        let team = sample_team();
        assert_eq!(team.head_to_head_wins(&["B"]), 2);
        assert_eq!(team.head_to_head_wins(&["C"]), 0);
        assert_eq!(team.head_to_head_wins(&["B", "D"]), 3);
        assert_eq!(team.head_to_head_wins(&[]), 0);
        // Listing itself must not count every win
        assert_eq!(team.head_to_head_wins(&["A"]), 0);
    }

    #[test]
    fn test_wins_in_second_half_uses_split_week() {
        let team = sample_team();
        assert_eq!(team.wins_in_second_half(4), 2);
        assert_eq!(team.wins_in_second_half(5), 1);
        assert_eq!(team.wins_in_second_half(0), 3);
    }
}
