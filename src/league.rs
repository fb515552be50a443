// A League is built once per scenario from a flat list of matches.
// It owns its teams, derives the record table and initial standings at construction,
// and then runs its configured tiebreak cascade exactly once.

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LeagueError, Result};
use crate::fixture::Match;
use crate::standings::{Rank, Standings};
use crate::team::{Record, Team};
use crate::tiebreak::{self, TiebreakRule, TiebreakStage};

/// Which competition and split a set of matches belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeagueId {
    pub name: String,
    pub year: u32,
    pub season: String,
}

impl LeagueId {
    /// Name is upper-cased and season capitalised, so "lec"/"summer" and "LEC"/"Summer" are the same league.
    pub fn new(name: &str, year: u32, season: &str) -> LeagueId {
        let season = season.to_lowercase();
        let mut chars = season.chars();
        let season = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        LeagueId {
            name: name.to_uppercase(),
            year,
            season,
        }
    }
}

impl fmt::Display for LeagueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.season, self.year)
    }
}

/// Tiebreak configuration a league is parameterised with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub tiebreakers: Vec<TiebreakRule>,
    pub split_week: u32,
}

impl RuleSet {
    pub fn new(tiebreakers: Vec<TiebreakRule>, split_week: u32) -> RuleSet {
        RuleSet {
            tiebreakers,
            split_week,
        }
    }

    pub fn for_league(name: &str, split_week: u32) -> RuleSet {
        RuleSet::new(TiebreakRule::preset(name), split_week)
    }
}

#[derive(Debug, Clone)]
pub struct League {
    pub id: LeagueId,
    teams: FnvHashMap<String, Team>,
    /// Team names in order of first appearance in the match list
    order: Vec<String>,
    standings: Standings,
    rules: RuleSet,
    stage: TiebreakStage,
}

impl League {
    /// Build a league from every match of a season; each team gets its own copy of its matches.
    pub fn from_matches<'a>(
        id: LeagueId,
        matches: impl IntoIterator<Item = &'a Match>,
        rules: RuleSet,
    ) -> Result<League> {
        let mut teams: FnvHashMap<String, Team> = FnvHashMap::default();
        let mut order: Vec<String> = Vec::new();

        for m in matches {
            for name in [&m.teams.0, &m.teams.1] {
                let team = teams.entry(name.clone()).or_insert_with(|| {
                    order.push(name.clone());
                    Team::new(name)
                });
                team.matches.push(m.clone());
            }
        }

        if teams.is_empty() {
            return Err(LeagueError::EmptyLeague(id.to_string()));
        }

        let mut league = League {
            id,
            teams,
            order,
            standings: Standings::new(),
            rules,
            stage: TiebreakStage::Unresolved,
        };
        league.standings = league.compute_standings();
        Ok(league)
    }

    /// Team records sorted by wins descending, then losses ascending.
    /// Equal records keep match-list order.
    pub fn table(&self) -> Vec<(String, Record)> {
        let mut table: Vec<(String, Record)> = self
            .order
            .iter()
            .filter_map(|name| self.teams.get(name).map(|t| (name.clone(), t.record())))
            .collect();
        table.sort_by(|(_, (wa, la)), (_, (wb, lb))| wb.cmp(wa).then(la.cmp(lb)));
        table
    }

    /// One bucket per distinct record, ranked by how many teams are strictly above.
    pub fn compute_standings(&self) -> Standings {
        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut last: Option<Record> = None;
        for (name, record) in self.table() {
            if last == Some(record) && !groups.is_empty() {
                let current = groups.len() - 1;
                groups[current].push(name);
            } else {
                groups.push(vec![name]);
            }
            last = Some(record);
        }
        Standings::from_groups(groups)
    }

    /// Run the tiebreak cascade. Calling it again once resolved leaves the standings untouched.
    ///
    /// The stage guard is what makes this idempotent: the cascade itself would split any
    /// sub-bucket left by the first run if it were applied again.
    pub fn resolve_tiebreakers(&mut self) -> Result<TiebreakStage> {
        if let TiebreakStage::Final { .. } = self.stage {
            return Ok(self.stage);
        }

        for rule in self.rules.tiebreakers.clone() {
            self.stage = TiebreakStage::Pass(rule);
            let stage = tiebreak::resolve(
                &mut self.standings,
                &self.teams,
                std::slice::from_ref(&rule),
                self.rules.split_week,
            )?;
            log::trace!("{}: {} pass done ({:?})", self.id, rule, stage);
        }

        let tied_buckets = self.standings.iter().filter(|(_, teams)| teams.len() > 1).count();
        self.stage = TiebreakStage::Final { tied_buckets };
        Ok(self.stage)
    }

    pub fn standings(&self) -> &Standings {
        &self.standings
    }

    pub fn into_standings(self) -> Standings {
        self.standings
    }

    pub fn stage(&self) -> TiebreakStage {
        self.stage
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.get(name)
    }

    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|name| name.as_str())
    }

    pub fn team_count(&self) -> usize {
        self.order.len()
    }

    /// One line per team: shared rank, name and record, in standings order.
    pub fn standings_rows(&self) -> Vec<(Rank, String, Record)> {
        self.standings
            .iter()
            .flat_map(|(rank, bucket)| {
                bucket.iter().map(move |name| {
                    let record = self.teams.get(name).map(|t| t.record()).unwrap_or((0, 0));
                    (rank, name.clone(), record)
                })
            })
            .collect()
    }

    pub fn print_standings(&self) {
        println!("\n{} standings:", self.id);
        println!("{:>4} {:<25} {:>5} {:>5}", "Rank", "Team", "W", "L");
        println!("{}", "-".repeat(42));

        for (rank, name, (wins, losses)) in self.standings_rows() {
            println!(
                "{:>4} {:<25} {:>5} {:>5}",
                rank,
                name.chars().take(25).collect::<String>(),
                wins,
                losses
            );
        }
        if let TiebreakStage::Final { tied_buckets } = self.stage {
            if tied_buckets > 0 {
                println!("{} rank(s) still tied after all tiebreakers", tied_buckets);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::random_league_matches;
    use rand::{Rng, SeedableRng};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn id() -> LeagueId {
        LeagueId::new("lec", 2020, "summer")
    }

    fn rules() -> RuleSet {
        RuleSet::new(vec![TiebreakRule::HeadToHead, TiebreakRule::SecondHalfWins], 4)
    }

    #[test]
    fn test_league_id_normalises() {
        let id = LeagueId::new("lcs", 2020, "SUMMER");
        assert_eq!(id.name, "LCS");
        assert_eq!(id.season, "Summer");
        assert_eq!(id.to_string(), "LCS Summer 2020");
    }

    #[test]
    fn test_empty_league_is_rejected() {
        let err = League::from_matches(id(), &Vec::<Match>::new(), rules()).unwrap_err();
        assert!(matches!(err, LeagueError::EmptyLeague(_)));
    }

    #[test]
    fn test_table_orders_by_wins_then_losses() {
        let matches = vec![
            Match::played("A", "B", 1, 1, 0),
            Match::played("B", "C", 1, 1, 0),
            Match::played("C", "A", 3, 1, 0),
            Match::new("B", "D", 3),
        ];
        let league = League::from_matches(id(), &matches, rules()).unwrap();
        let table = league.table();
        assert_eq!(
            table,
            vec![
                ("A".to_string(), (1, 1)),
                ("B".to_string(), (1, 1)),
                ("C".to_string(), (1, 1)),
                ("D".to_string(), (0, 0)),
            ]
        );
    }

    #[test]
    fn test_table_secondary_key_is_losses() {
        let matches = vec![
            Match::played("A", "B", 1, 1, 0),
            Match::played("B", "C", 1, 1, 0),
            Match::played("C", "A", 2, 0, 1),
            Match::played("C", "A", 3, 1, 0),
        ];
        let league = League::from_matches(id(), &matches, rules()).unwrap();
        let standings = league.standings();
        assert_eq!(standings.get(1), Some(&names(&["A"])[..]));
        assert_eq!(standings.get(2), Some(&names(&["B"])[..]));
        assert_eq!(standings.get(3), Some(&names(&["C"])[..]));
    }

    #[test]
    fn test_standings_share_ranks_and_skip() {
        // A 2-0, B 1-1, C 1-1, D 0-2
        let matches = vec![
            Match::played("A", "B", 1, 1, 0),
            Match::played("C", "D", 1, 1, 0),
            Match::played("A", "C", 2, 1, 0),
            Match::played("B", "D", 2, 1, 0),
        ];
        let league = League::from_matches(id(), &matches, rules()).unwrap();
        let standings = league.standings();
        assert_eq!(standings.get(1), Some(&names(&["A"])[..]));
        assert_eq!(standings.get(2), Some(&names(&["B", "C"])[..]));
        assert_eq!(standings.get(3), None);
        assert_eq!(standings.get(4), Some(&names(&["D"])[..]));
    }

    #[test]
    fn test_head_to_head_breaks_equal_records() {
        // X and Y both 2-1, X beat Y
        let matches = vec![
            Match::played("Y", "X", 1, 0, 1),
            Match::played("X", "Z", 2, 0, 1),
            Match::played("X", "W", 3, 1, 0),
            Match::played("Y", "Z", 2, 1, 0),
            Match::played("Y", "W", 3, 1, 0),
        ];
        let mut league = League::from_matches(id(), &matches, rules()).unwrap();
        assert_eq!(league.standings().rank_of("X"), league.standings().rank_of("Y"));
        league.resolve_tiebreakers().unwrap();
        assert!(league.standings().rank_of("X") < league.standings().rank_of("Y"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let matches = random_league_matches(&mut rng, 6);
            let mut league = League::from_matches(id(), &matches, rules()).unwrap();
            let first_stage = league.resolve_tiebreakers().unwrap();
            let once = league.standings().clone();
            let second_stage = league.resolve_tiebreakers().unwrap();
            assert_eq!(&once, league.standings());
            assert_eq!(first_stage, second_stage);
        }
    }

    #[test]
    fn test_resolve_twice_keeps_partial_split() {
        // A, B, C and D all 2-2. Among them A beat B and D, B beat C, C beat D
        let matches = vec![
            Match::played("A", "B", 1, 1, 0),
            Match::played("B", "C", 1, 1, 0),
            Match::played("A", "D", 2, 1, 0),
            Match::played("C", "D", 2, 1, 0),
            Match::played("E", "A", 3, 1, 0),
            Match::played("F", "A", 3, 1, 0),
            Match::played("B", "E", 3, 1, 0),
            Match::played("F", "B", 4, 1, 0),
            Match::played("C", "E", 4, 1, 0),
            Match::played("F", "C", 4, 1, 0),
            Match::played("D", "E", 4, 1, 0),
            Match::played("D", "F", 4, 1, 0),
        ];
        let mut league = League::from_matches(id(), &matches, rules()).unwrap();
        assert_eq!(league.standings().get(2), Some(&names(&["A", "B", "C", "D"])[..]));

        let first_stage = league.resolve_tiebreakers().unwrap();
        let once = league.standings().clone();
        assert_eq!(first_stage, TiebreakStage::Final { tied_buckets: 1 });
        assert_eq!(once.get(1), Some(&names(&["F"])[..]));
        assert_eq!(once.get(2), Some(&names(&["A"])[..]));
        assert_eq!(once.get(3), Some(&names(&["B", "C"])[..]));
        assert_eq!(once.get(5), Some(&names(&["D"])[..]));
        assert_eq!(once.get(6), Some(&names(&["E"])[..]));

        let second_stage = league.resolve_tiebreakers().unwrap();
        assert_eq!(second_stage, first_stage);
        assert_eq!(&once, league.standings());
    }

    #[test]
    fn test_resolution_keeps_partition_and_order_outside_buckets() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let n = rng.gen_range(3..9);
            let matches = random_league_matches(&mut rng, n);
            let mut league = League::from_matches(id(), &matches, rules()).unwrap();
            let before = league.standings().clone();
            league.resolve_tiebreakers().unwrap();
            let after = league.standings();

            assert_eq!(after.team_count(), league.team_count());
            assert!(after.is_partition_of(league.team_names()));

            // Teams never jump over a team that was not in their original bucket
            let names: Vec<&str> = league.team_names().collect();
            for a in &names {
                for b in &names {
                    let (ra, rb) = (before.rank_of(a).unwrap(), before.rank_of(b).unwrap());
                    if ra < rb {
                        assert!(after.rank_of(a).unwrap() < after.rank_of(b).unwrap());
                    }
                }
            }
        }
    }

    #[test]
    fn test_standings_rows_follow_ranks() {
        let matches = vec![
            Match::played("A", "B", 1, 1, 0),
            Match::played("C", "D", 1, 1, 0),
            Match::played("A", "C", 2, 1, 0),
            Match::played("B", "D", 2, 1, 0),
        ];
        let league = League::from_matches(id(), &matches, rules()).unwrap();
        let rows = league.standings_rows();
        assert_eq!(rows[0], (1, "A".to_string(), (2, 0)));
        assert_eq!(rows[1].0, 2);
        assert_eq!(rows[2].0, 2);
        assert_eq!(rows[3], (4, "D".to_string(), (0, 2)));
    }

    #[test]
    fn test_stage_progresses_to_final() {
        let matches = vec![Match::played("A", "B", 1, 1, 0), Match::new("A", "C", 2)];
        let mut league = League::from_matches(id(), &matches, rules()).unwrap();
        assert_eq!(league.stage(), TiebreakStage::Unresolved);
        // B and C both 0-1 / 0-0 -> different records, nothing tied
        let stage = league.resolve_tiebreakers().unwrap();
        assert_eq!(stage, TiebreakStage::Final { tied_buckets: 0 });
    }
}
