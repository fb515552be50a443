// Fixtures shared by the unit tests of several modules.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::fixture::Match;

/// Double round robin over `n` teams with every match decided at random.
pub(crate) fn random_league_matches(rng: &mut impl Rng, n: usize) -> Vec<Match> {
    let teams: Vec<String> = (0..n).map(|i| format!("T{}", i)).collect();
    let mut matches = Vec::new();
    let mut week = 1;
    for leg in 0..2 {
        for i in 0..n {
            for j in (i + 1)..n {
                let (home, away) = if leg == 0 { (&teams[i], &teams[j]) } else { (&teams[j], &teams[i]) };
                let (a, b) = if rng.gen_bool(0.5) { (1, 0) } else { (0, 1) };
                matches.push(Match::played(home, away, week, a, b));
                week = week % 9 + 1;
            }
        }
    }
    matches.shuffle(rng);
    matches
}

/// Same schedule shape, with the last `unplayed` matches left without a result.
pub(crate) fn random_partial_league(rng: &mut impl Rng, n: usize, unplayed: usize) -> Vec<Match> {
    let mut matches = random_league_matches(rng, n);
    let len = matches.len();
    for m in matches.iter_mut().skip(len.saturating_sub(unplayed)) {
        m.result = None;
    }
    matches
}

/// The three-team league used throughout the engine docs: A beat B and C, B beat C, C v A unplayed.
pub(crate) fn three_team_league() -> Vec<Match> {
    vec![
        Match::played("A", "B", 1, 1, 0),
        Match::played("B", "C", 1, 1, 0),
        Match::played("A", "C", 2, 1, 0),
        Match::new("C", "A", 3),
    ]
}
