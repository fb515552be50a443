// Configuration module for the league possibility calculator
// Supports YAML configuration files for the league identity, tiebreak rules, reporting and the engine

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LeagueError, Result};
use crate::league::{LeagueId, RuleSet};
use crate::standings::Rank;
use crate::tiebreak::TiebreakRule;

/// 2^63 scenarios is the most a u64 index can count
pub const MAX_UNPLAYED_CEILING: usize = 63;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub league: LeagueSettings,

    /// Match file; defaults to `<name>_matches.json`
    #[serde(default)]
    pub matches_file: Option<String>,

    /// Report file; defaults to `<name>_output.md`
    #[serde(default)]
    pub output_file: Option<String>,

    /// Ranks that count as a playoff spot in reports; falls back to the league preset
    #[serde(default)]
    pub playoff_slots: Option<usize>,

    /// Wins in weeks after this one count as second-half wins
    #[serde(default = "default_split_week")]
    pub split_week: u32,

    /// Ordered tiebreak rules; falls back to the league preset
    #[serde(default)]
    pub tiebreakers: Option<Vec<TiebreakRule>>,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub watch: Option<WatchSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            league: LeagueSettings::default(),
            matches_file: None,
            output_file: None,
            playoff_slots: None,
            split_week: default_split_week(),
            tiebreakers: None,
            engine: EngineSettings::default(),
            watch: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Err(LeagueError::Config(format!("Config file not found: {}", path)));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| LeagueError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| LeagueError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the given file, or the first default location that exists, or the built-in defaults.
    /// A file named explicitly must load; the default locations are best effort.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                for default_path in &["leagueprobs.yaml", "leagueprobs.yml", "config.yaml"] {
                    if Path::new(default_path).exists() {
                        match Self::from_file(default_path) {
                            Ok(config) => {
                                log::info!("Loaded configuration from {}", default_path);
                                return Ok(config);
                            }
                            Err(e) => log::warn!("Skipping {}: {}", default_path, e),
                        }
                    }
                }
                Ok(Self::default())
            }
        }
    }

    /// Save configuration to a YAML file
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| LeagueError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, yaml)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.league.name.trim().is_empty() {
            return Err(LeagueError::Config("league.name must not be empty".to_string()));
        }
        if self.playoff_slots == Some(0) {
            return Err(LeagueError::Config("playoff_slots must be at least 1".to_string()));
        }
        if self.engine.channel_capacity == 0 {
            return Err(LeagueError::Config("engine.channel_capacity must be at least 1".to_string()));
        }
        if self.engine.max_unplayed > MAX_UNPLAYED_CEILING {
            return Err(LeagueError::Config(format!(
                "engine.max_unplayed cannot exceed {}",
                MAX_UNPLAYED_CEILING
            )));
        }
        if let Some(watch) = &self.watch {
            if watch.rank == 0 {
                return Err(LeagueError::Config("watch.rank starts at 1".to_string()));
            }
        }
        Ok(())
    }

    pub fn league_id(&self) -> LeagueId {
        LeagueId::new(&self.league.name, self.league.year, &self.league.season)
    }

    pub fn matches_path(&self) -> PathBuf {
        match &self.matches_file {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(format!("{}_matches.json", self.league.name.to_lowercase())),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        match &self.output_file {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(format!("{}_output.md", self.league.name.to_lowercase())),
        }
    }

    pub fn playoff_slots(&self) -> usize {
        self.playoff_slots
            .unwrap_or_else(|| preset_playoff_slots(&self.league.name))
    }

    pub fn rule_set(&self) -> RuleSet {
        match &self.tiebreakers {
            Some(rules) => RuleSet::new(rules.clone(), self.split_week),
            None => RuleSet::for_league(&self.league.name, self.split_week),
        }
    }
}

/// League identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSettings {
    #[serde(default = "default_league_name")]
    pub name: String,

    #[serde(default = "default_year")]
    pub year: u32,

    #[serde(default = "default_season")]
    pub season: String,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        LeagueSettings {
            name: default_league_name(),
            year: default_year(),
            season: default_season(),
        }
    }
}

fn default_league_name() -> String { "LEC".to_string() }
fn default_year() -> u32 { 2020 }
fn default_season() -> String { "Summer".to_string() }
fn default_split_week() -> u32 { 4 }

/// Scenario enumeration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Worker threads; 0 uses one per CPU core
    #[serde(default)]
    pub threads: usize,

    /// Capacity of the worker -> aggregator channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Refuse to enumerate when more matches than this are unplayed
    #[serde(default = "default_max_unplayed")]
    pub max_unplayed: usize,

    /// Show a progress bar while scenarios are processed
    #[serde(default = "default_progress")]
    pub progress: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            threads: 0,
            channel_capacity: default_channel_capacity(),
            max_unplayed: default_max_unplayed(),
            progress: default_progress(),
        }
    }
}

impl EngineSettings {
    pub fn thread_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// Unplayed-match limit actually enforced
    pub fn unplayed_limit(&self) -> usize {
        self.max_unplayed.min(MAX_UNPLAYED_CEILING)
    }
}

fn default_channel_capacity() -> usize { 1024 }
fn default_max_unplayed() -> usize { 24 }
fn default_progress() -> bool { true }

/// Keep the outcome lists of scenarios where `team` finishes at exactly `rank`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSettings {
    pub team: String,
    pub rank: Rank,

    #[serde(default = "default_watch_limit")]
    pub limit: usize,
}

fn default_watch_limit() -> usize { 10 }

/// Playoff spots per league when the configuration does not set them
pub fn preset_playoff_slots(league_name: &str) -> usize {
    match league_name.to_uppercase().as_str() {
        "LCS" => 8,
        _ => 6,
    }
}

/// Generate a sample configuration file for `league`
pub fn generate_sample_config(league: &str) -> String {
    let name = league.to_uppercase();
    let rules: Vec<&str> = TiebreakRule::preset(&name)
        .iter()
        .map(|rule| match rule {
            TiebreakRule::HeadToHead => "head_to_head",
            TiebreakRule::SecondHalfWins => "second_half_wins",
        })
        .collect();

    let file_stem = name.to_lowercase();
    format!(
        r#"# League possibility calculator configuration
# All values shown are defaults for {name} - uncomment and modify as needed

league:
  name: {name}
  year: 2020
  season: Summer

# Match list (JSON) and report locations
# matches_file: {file_stem}_matches.json
# output_file: {file_stem}_output.md

# Ranks that count as a playoff spot in the report
playoff_slots: {slots}

# Wins in weeks after this one count as second-half wins
split_week: 4

# Tiebreak rules, applied in order to teams with identical records
# Available: head_to_head, second_half_wins
tiebreakers: [{rules}]

# Scenario enumeration
engine:
  # Worker threads (0 = one per CPU core)
  threads: 0
  # Capacity of the channel between workers and the aggregator
  channel_capacity: 1024
  # Refuse to run with more unplayed matches than this (2^n scenarios)
  max_unplayed: 24
  # Show a progress bar
  progress: true

# Keep the outcomes of scenarios where a team finishes at a given rank
# watch:
#   team: G2
#   rank: 1
#   limit: 10
"#,
        name = name,
        file_stem = file_stem,
        slots = preset_playoff_slots(&name),
        rules = rules.join(", "),
    )
}
