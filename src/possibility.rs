// Exhaustive enumeration of the remaining season.
//
// Every unplayed match has two outcomes, so U unplayed matches give 2^U scenarios. Scenario
// `index` reads its outcomes off the bits of the index: the first unplayed match is the most
// significant bit and a set bit means the first listed team wins. Each scenario builds its own
// League from fresh copies of the matches, resolves tiebreakers and sends the standings to a
// single aggregator over a bounded channel. The aggregator knows how many scenarios were
// dispatched and stops after exactly that many messages.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::aggregate::Aggregate;
use crate::config::{EngineSettings, WatchSettings};
use crate::error::{LeagueError, Result, ScenarioError};
use crate::fixture::Match;
use crate::ingest::{self, MatchRecord};
use crate::league::{League, LeagueId, RuleSet};
use crate::standings::Standings;

/// Shared flag to stop a run early. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancel this token on Ctrl-C. Only one handler can be installed per process.
    pub fn cancel_on_interrupt(&self) -> Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            log::warn!("Interrupted, skipping the scenarios not yet started");
            token.cancel();
        })?;
        Ok(())
    }
}

/// What a worker sends back for one scenario.
#[derive(Debug)]
enum ScenarioOutcome {
    Resolved { index: u64, standings: Standings },
    Failed(ScenarioError),
    Cancelled,
}

/// One scenario kept by the watch: its index and the unplayed matches with the results it gave them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchedScenario {
    pub index: u64,
    pub matches: Vec<MatchRecord>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub aggregate: Aggregate,
    pub elapsed: Duration,
    /// Scenarios dispatched (2^U)
    pub scenarios: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub watched: Vec<WatchedScenario>,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.completed == self.scenarios
    }

    /// Teams whose totals are short of the scenario count, with the missing amount.
    pub fn shortfalls(&self) -> Vec<(String, u64)> {
        self.aggregate.shortfalls(self.scenarios)
    }
}

#[derive(Debug, Clone)]
pub struct PossibilityEngine {
    id: LeagueId,
    /// Full list in input order
    matches: Vec<Match>,
    /// Positions of the unfinished matches within `matches`
    unfinished_at: Vec<usize>,
    finished: Vec<Match>,
    unfinished: Vec<Match>,
    /// Team names in order of first appearance
    teams: Vec<String>,
    rules: RuleSet,
    settings: EngineSettings,
    watch: Option<WatchSettings>,
}

impl PossibilityEngine {
    /// Validate and partition the match list. Fails before anything is enumerated.
    pub fn new(
        id: LeagueId,
        matches: &[Match],
        rules: RuleSet,
        settings: EngineSettings,
    ) -> Result<PossibilityEngine> {
        ingest::validate_matches(matches)?;
        let (finished, unfinished) = ingest::partition(matches);

        let limit = settings.unplayed_limit();
        if unfinished.len() > limit {
            return Err(LeagueError::TooManyUnplayed {
                count: unfinished.len(),
                max: limit,
            });
        }

        let mut teams: Vec<String> = Vec::new();
        for m in matches {
            for name in [&m.teams.0, &m.teams.1] {
                if !teams.contains(name) {
                    teams.push(name.clone());
                }
            }
        }
        if teams.is_empty() {
            return Err(LeagueError::EmptyLeague(id.to_string()));
        }

        log::debug!(
            "{}: {} teams, {} finished and {} unfinished matches",
            id,
            teams.len(),
            finished.len(),
            unfinished.len()
        );

        let unfinished_at = matches
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_played())
            .map(|(i, _)| i)
            .collect();

        Ok(PossibilityEngine {
            id,
            matches: matches.to_vec(),
            unfinished_at,
            finished,
            unfinished,
            teams,
            rules,
            settings,
            watch: None,
        })
    }

    pub fn with_watch(mut self, watch: Option<WatchSettings>) -> PossibilityEngine {
        self.watch = watch;
        self
    }

    pub fn id(&self) -> &LeagueId {
        &self.id
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn finished(&self) -> &[Match] {
        &self.finished
    }

    pub fn unfinished(&self) -> &[Match] {
        &self.unfinished
    }

    pub fn scenario_count(&self) -> u64 {
        1u64 << self.unfinished.len()
    }

    /// Outcome of every unfinished match in scenario `index`; `true` means the first team wins.
    pub fn outcome_vector(&self, index: u64) -> Vec<bool> {
        let count = self.unfinished.len();
        (0..count)
            .map(|i| (index >> (count - 1 - i)) & 1 == 1)
            .collect()
    }

    /// Fresh copy of the whole match list, in input order, with the unfinished matches decided.
    pub fn scenario_matches(&self, index: u64) -> Vec<Match> {
        let mut matches = self.matches.clone();
        for (position, first_team_wins) in self.unfinished_at.iter().zip(self.outcome_vector(index)) {
            matches[*position] = matches[*position].with_outcome(first_team_wins);
        }
        matches
    }

    /// Only the unfinished matches, with the results scenario `index` gives them.
    pub fn decided_unfinished(&self, index: u64) -> Vec<Match> {
        self.unfinished
            .iter()
            .zip(self.outcome_vector(index))
            .map(|(m, first_team_wins)| m.with_outcome(first_team_wins))
            .collect()
    }

    /// Build, resolve and read off the standings of one scenario.
    pub fn run_scenario(&self, index: u64) -> Result<Standings> {
        let matches = self.scenario_matches(index);
        let mut league = League::from_matches(self.id.clone(), &matches, self.rules.clone())?;
        let stage = league.resolve_tiebreakers()?;
        log::trace!("Scenario {} resolved ({:?})", index, stage);

        self.check_coverage(index, league.into_standings())
    }

    /// Every team of the league in exactly one bucket, and nobody else.
    fn check_coverage(&self, index: u64, standings: Standings) -> Result<Standings> {
        if !standings.is_partition_of(self.teams.iter().map(|name| name.as_str())) {
            return Err(LeagueError::IncompleteStandings { index });
        }
        Ok(standings)
    }

    /// Standings from the played matches only, tiebreakers applied.
    pub fn current_league(&self) -> Result<League> {
        let mut league = League::from_matches(self.id.clone(), &self.matches, self.rules.clone())?;
        league.resolve_tiebreakers()?;
        Ok(league)
    }

    /// Enumerate every scenario on a worker pool and aggregate the standings.
    pub fn run(&self, cancel: &CancelToken) -> Result<RunSummary> {
        let total = self.scenario_count();
        let threads = self.settings.thread_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| LeagueError::Pool(e.to_string()))?;

        log::info!(
            "{}: enumerating {} scenarios ({} unplayed matches) on {} threads",
            self.id,
            total,
            self.unfinished.len(),
            threads
        );

        let (tx, rx) = mpsc::sync_channel::<ScenarioOutcome>(self.settings.channel_capacity);
        let progress = self.progress_bar(total);
        let start = Instant::now();

        let mut summary = thread::scope(|scope| {
            scope.spawn(|| {
                pool.install(|| {
                    (0..total).into_par_iter().for_each_with(tx, |tx, index| {
                        let outcome = if cancel.is_cancelled() {
                            ScenarioOutcome::Cancelled
                        } else {
                            run_guarded(index, || self.run_scenario(index))
                        };
                        // The receiver only goes away once the aggregator has stopped
                        let _ = tx.send(outcome);
                    });
                });
            });
            self.aggregate_outcomes(rx, total, &progress)
        });

        summary.elapsed = start.elapsed();
        progress.finish_and_clear();

        log::info!(
            "{}: {} of {} scenarios completed in {:.2?}",
            self.id,
            summary.completed,
            total,
            summary.elapsed
        );
        if summary.cancelled > 0 {
            log::warn!("Run cancelled, {} scenarios skipped", summary.cancelled);
        }
        if summary.failed > 0 {
            log::warn!("{} scenarios failed and were excluded", summary.failed);
        }
        for (team, missing) in summary.shortfalls() {
            log::warn!(
                "{} counted in {} of {} scenarios ({} missing)",
                team,
                summary.aggregate.total_for(&team),
                total,
                missing
            );
        }

        Ok(summary)
    }

    /// Sole owner of the aggregate. Receives exactly `total` messages.
    fn aggregate_outcomes(&self, rx: Receiver<ScenarioOutcome>, total: u64, progress: &ProgressBar) -> RunSummary {
        let mut aggregate = Aggregate::new(self.teams.iter().map(|name| name.as_str()));
        let (mut completed, mut failed, mut cancelled) = (0u64, 0u64, 0u64);
        let mut watched_indices: BTreeSet<u64> = BTreeSet::new();

        for received in 0..total {
            let outcome = match rx.recv() {
                Ok(outcome) => outcome,
                Err(_) => {
                    log::error!(
                        "Workers stopped after {} of {} scenarios",
                        received,
                        total
                    );
                    failed += total - received;
                    break;
                }
            };

            match outcome {
                ScenarioOutcome::Resolved { index, standings } => {
                    if let Some(watch) = &self.watch {
                        if standings.rank_of(&watch.team) == Some(watch.rank) {
                            watched_indices.insert(index);
                            // Keep the lowest indices so the selection does not depend on scheduling
                            if watched_indices.len() > watch.limit {
                                watched_indices.pop_last();
                            }
                        }
                    }
                    aggregate.record(&standings);
                    completed += 1;
                }
                ScenarioOutcome::Failed(err) => {
                    log::error!("{}", err);
                    failed += 1;
                }
                ScenarioOutcome::Cancelled => cancelled += 1,
            }
            progress.inc(1);
        }

        let watched = watched_indices
            .into_iter()
            .map(|index| WatchedScenario {
                index,
                matches: self.decided_unfinished(index).iter().map(MatchRecord::from).collect(),
            })
            .collect();

        RunSummary {
            aggregate,
            elapsed: Duration::default(),
            scenarios: total,
            completed,
            failed,
            cancelled,
            watched,
        }
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.settings.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40}] {pos}/{len} scenarios ({eta})")
                .progress_chars("=> "),
        );
        pb
    }
}

/// Run one scenario, turning both errors and panics into a failed outcome.
fn run_guarded<F>(index: u64, compute: F) -> ScenarioOutcome
where
    F: FnOnce() -> Result<Standings>,
{
    match panic::catch_unwind(AssertUnwindSafe(compute)) {
        Ok(Ok(standings)) => ScenarioOutcome::Resolved { index, standings },
        Ok(Err(e)) => ScenarioOutcome::Failed(ScenarioError::new(index, e.to_string())),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            ScenarioOutcome::Failed(ScenarioError::new(index, message))
        }
    }
}
