// Tiebreak rules and the cascade that applies them to tied rank buckets.
//
// Each rule is one pass over every bucket holding more than one team. A pass reads an
// immutable snapshot, collects the moves for the whole table and only then applies them,
// so relocating one team never changes the comparison set of another in the same pass.
// Teams still sharing a bucket after the last rule stay tied: real leagues play an extra
// game for that, which is not modelled here.

use clap::ValueEnum;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{LeagueError, Result};
use crate::standings::{Move, Rank, Standings, StandingsSnapshot};
use crate::team::Team;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakRule {
    /// Wins against the other teams of the same bucket
    HeadToHead,
    /// Wins after the split week
    SecondHalfWins,
}

/// What a rule may look at while comparing two teams of one bucket.
#[derive(Debug, Clone, Copy)]
pub struct TiebreakContext<'a> {
    pub bucket: &'a [String],
    pub split_week: u32,
}

impl TiebreakRule {
    /// Higher is better.
    pub fn key(&self, team: &Team, ctx: &TiebreakContext) -> u32 {
        match self {
            TiebreakRule::HeadToHead => {
                let others: Vec<&str> = ctx
                    .bucket
                    .iter()
                    .map(|name| name.as_str())
                    .filter(|name| *name != team.name)
                    .collect();
                team.head_to_head_wins(&others)
            }
            TiebreakRule::SecondHalfWins => team.wins_in_second_half(ctx.split_week),
        }
    }

    /// `Less` means `a` places above `b`.
    pub fn compare(&self, a: &Team, b: &Team, ctx: &TiebreakContext) -> Ordering {
        self.key(b, ctx).cmp(&self.key(a, ctx))
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TiebreakRule::HeadToHead => {
                "by tied standings the team with the favored head-to-head record gets the higher standing"
            }
            TiebreakRule::SecondHalfWins => {
                "the team with more wins in the 2nd half of the split gets the higher placing"
            }
        }
    }

    /// Rule list used by a league when the configuration does not name one.
    pub fn preset(league_name: &str) -> Vec<TiebreakRule> {
        match league_name.to_uppercase().as_str() {
            "LCS" => vec![TiebreakRule::HeadToHead],
            _ => vec![TiebreakRule::HeadToHead, TiebreakRule::SecondHalfWins],
        }
    }
}

impl fmt::Display for TiebreakRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiebreakRule::HeadToHead => write!(f, "head-to-head"),
            TiebreakRule::SecondHalfWins => write!(f, "second-half wins"),
        }
    }
}

/// Where a league is in its tiebreak cascade. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiebreakStage {
    Unresolved,
    Pass(TiebreakRule),
    /// All rules applied; `tied_buckets` is how many buckets still hold several teams.
    Final { tied_buckets: usize },
}

/// Moves produced by one rule over every tied bucket of `snapshot`.
pub(crate) fn tiebreak_pass(
    rule: TiebreakRule,
    snapshot: &StandingsSnapshot,
    teams: &FnvHashMap<String, Team>,
    split_week: u32,
) -> Result<Vec<Move>> {
    let mut moves = Vec::new();

    for (rank, bucket) in snapshot.tied_buckets() {
        let ctx = TiebreakContext { bucket, split_week };

        let mut members: Vec<&Team> = Vec::with_capacity(bucket.len());
        for name in bucket {
            let team = teams
                .get(name)
                .ok_or_else(|| LeagueError::UnknownTeam(name.clone()))?;
            members.push(team);
        }

        // Stable: equal keys keep their bucket order
        let mut keyed: Vec<(&Team, u32)> = members.iter().map(|t| (*t, rule.key(t, &ctx))).collect();
        keyed.sort_by(|a, b| b.1.cmp(&a.1));

        for (offset, team) in sub_rank_offsets(&keyed) {
            if offset > 0 {
                moves.push(Move {
                    team: team.name.clone(),
                    rank: rank + offset,
                });
            }
        }
    }

    Ok(moves)
}

/// For teams sorted by key, the sub-rank offset of each: how many teams of the bucket are strictly above it.
fn sub_rank_offsets<'a>(keyed: &[(&'a Team, u32)]) -> Vec<(Rank, &'a Team)> {
    let mut offsets = Vec::with_capacity(keyed.len());
    let mut group_offset: Rank = 0;
    for (i, (team, key)) in keyed.iter().enumerate() {
        if i > 0 && *key != keyed[i - 1].1 {
            group_offset = i as Rank;
        }
        offsets.push((group_offset, *team));
    }
    offsets
}

/// Run the full cascade of `rules` over `standings`, returning the final stage.
///
/// Each rule runs once. A second cascade over the result may split the sub-buckets the first
/// one produced, so callers go through `League::resolve_tiebreakers`, which runs it only once.
pub(crate) fn resolve(
    standings: &mut Standings,
    teams: &FnvHashMap<String, Team>,
    rules: &[TiebreakRule],
    split_week: u32,
) -> Result<TiebreakStage> {
    for rule in rules {
        if !standings.has_ties() {
            break;
        }
        let snapshot = standings.snapshot();
        let moves = tiebreak_pass(*rule, &snapshot, teams, split_week)?;
        log::trace!("{} pass relocated {} teams", rule, moves.len());
        standings.apply(&moves);
    }

    let tied_buckets = standings.iter().filter(|(_, teams)| teams.len() > 1).count();
    Ok(TiebreakStage::Final { tied_buckets })
}
