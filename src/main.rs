//! League possibility calculator CLI
//!
//! Enumerates every outcome of the remaining matches of a split and reports how often
//! each team finishes at each rank.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use leagueprobs::config::generate_sample_config;
use leagueprobs::{
    ingest, CancelToken, Config, PossibilityEngine, Report, ReportFormat, Result, TiebreakRule,
};

#[derive(Parser)]
#[command(name = "leagueprobs")]
#[command(about = "Exact playoff probabilities for the rest of a league split", long_about = None)]
struct Cli {
    /// Config file path (default: leagueprobs.yaml if present)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate every remaining outcome and write the report
    Run {
        /// Override the match file
        #[arg(long)]
        matches: Option<PathBuf>,
        /// Override the report file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Worker threads (0 = one per CPU core)
        #[arg(long)]
        threads: Option<usize>,
        /// Override the second-half split week
        #[arg(long)]
        split_week: Option<u32>,
        /// Override the tiebreak rules, in order (repeat the flag)
        #[arg(long, value_enum)]
        tiebreaker: Vec<TiebreakRule>,
        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        /// Write the watched scenarios to this JSON file
        #[arg(long)]
        watch_out: Option<PathBuf>,
        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
    /// Print the standings from the matches played so far
    Standings {
        /// Override the match file
        #[arg(long)]
        matches: Option<PathBuf>,
        /// Override the second-half split week
        #[arg(long)]
        split_week: Option<u32>,
    },
    /// Write a sample configuration file
    Init {
        /// League preset to base the sample on
        #[arg(long, default_value = "LEC")]
        league: String,
        /// Where to write it
        #[arg(long, default_value = "leagueprobs.yaml")]
        path: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { league, path, force } => init(&league, &path, force),
        Commands::Standings { matches, split_week } => {
            let mut config = Config::load_or_default(cli.config.as_deref())?;
            if let Some(week) = split_week {
                config.split_week = week;
            }
            let matches_path = matches.unwrap_or_else(|| config.matches_path());
            let engine = build_engine(&config, &matches_path)?;
            engine.current_league()?.print_standings();
            println!(
                "\n{} matches played, {} to go ({} scenarios)",
                engine.finished().len(),
                engine.unfinished().len(),
                engine.scenario_count()
            );
            Ok(())
        }
        Commands::Run {
            matches,
            output,
            threads,
            split_week,
            tiebreaker,
            format,
            watch_out,
            no_progress,
        } => {
            let mut config = Config::load_or_default(cli.config.as_deref())?;
            if let Some(threads) = threads {
                config.engine.threads = threads;
            }
            if let Some(week) = split_week {
                config.split_week = week;
            }
            if !tiebreaker.is_empty() {
                config.tiebreakers = Some(tiebreaker);
            }
            if no_progress {
                config.engine.progress = false;
            }

            let matches_path = matches.unwrap_or_else(|| config.matches_path());
            let output_path = output.unwrap_or_else(|| default_output(&config, format));

            let engine = build_engine(&config, &matches_path)?.with_watch(config.watch.clone());
            let cancel = CancelToken::new();
            cancel.cancel_on_interrupt()?;
            let summary = engine.run(&cancel)?;

            let rules = engine.rules().tiebreakers.clone();
            let report = Report::new(engine.id(), &summary, &rules, config.playoff_slots());
            report.write_to_file(&output_path, format)?;

            if let Some(path) = watch_out {
                let json = serde_json::to_string_pretty(&summary.watched)?;
                fs::write(&path, json)?;
                log::info!(
                    "{} watched scenarios written to '{}'",
                    summary.watched.len(),
                    path.display()
                );
            } else if !summary.watched.is_empty() {
                for scenario in &summary.watched {
                    println!("Scenario {}:", scenario.index);
                    for m in engine.decided_unfinished(scenario.index) {
                        println!("  {}", m);
                    }
                }
            }
            Ok(())
        }
    }
}

fn build_engine(config: &Config, matches_path: &Path) -> Result<PossibilityEngine> {
    let matches = ingest::load_matches(matches_path)?;
    PossibilityEngine::new(
        config.league_id(),
        &matches,
        config.rule_set(),
        config.engine.clone(),
    )
}

/// The configured report path, with the extension following the format
fn default_output(config: &Config, format: ReportFormat) -> PathBuf {
    let path = config.output_path();
    match format {
        ReportFormat::Markdown => path,
        ReportFormat::Csv => path.with_extension("csv"),
        ReportFormat::Json => path.with_extension("json"),
    }
}

fn init(league: &str, path: &str, force: bool) -> Result<()> {
    if Path::new(path).exists() && !force {
        return Err(leagueprobs::LeagueError::Config(format!(
            "{} already exists, pass --force to overwrite",
            path
        )));
    }
    fs::write(path, generate_sample_config(league))?;
    println!("Wrote sample configuration to {}", path);
    Ok(())
}
