// Turns a finished run into something people read: a Markdown report with relative and
// absolute tables, a CSV sheet, or the raw aggregate as JSON.

use clap::ValueEnum;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use crate::aggregate::Aggregate;
use crate::error::Result;
use crate::league::LeagueId;
use crate::possibility::RunSummary;
use crate::tiebreak::TiebreakRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Csv,
    Json,
}

pub struct Report<'a> {
    pub id: &'a LeagueId,
    pub summary: &'a RunSummary,
    pub rules: &'a [TiebreakRule],
    pub playoff_slots: usize,
}

impl<'a> Report<'a> {
    pub fn new(
        id: &'a LeagueId,
        summary: &'a RunSummary,
        rules: &'a [TiebreakRule],
        playoff_slots: usize,
    ) -> Report<'a> {
        Report {
            id,
            summary,
            rules,
            playoff_slots,
        }
    }

    fn aggregate(&self) -> &Aggregate {
        &self.summary.aggregate
    }

    /// One column per possible rank
    fn rank_columns(&self) -> usize {
        self.aggregate().team_count()
    }

    /// Teams by their count vector (rank 1 first) descending, then by name.
    pub fn sorted_teams(&self) -> Vec<&str> {
        let ranks = self.rank_columns();
        let aggregate = self.aggregate();
        let mut teams: Vec<(&str, Vec<u64>)> = aggregate
            .teams()
            .map(|team| (team, aggregate.count_vector(team, ranks)))
            .collect();
        teams.sort_by(|(name_a, counts_a), (name_b, counts_b)| {
            counts_b.cmp(counts_a).then(name_a.cmp(name_b))
        });
        teams.into_iter().map(|(team, _)| team).collect()
    }

    pub fn explanation(&self) -> String {
        let mut text = format!("# All {} Playoff scenarios ({})\n\n", self.id.name, self.id);
        match self.rules {
            [] => text.push_str(
                "No tiebreaker rules are applied: teams with identical records share a rank.\n",
            ),
            [only] => {
                let _ = writeln!(text, "With accounting for the following tiebreaker rule:");
                let _ = writeln!(text, "1) {}.", only.describe());
            }
            rules => {
                let _ = writeln!(text, "With accounting for the following tiebreaker rules:");
                for (i, rule) in rules.iter().enumerate() {
                    if i == 0 {
                        let _ = writeln!(text, "1) {},", rule.describe());
                    } else {
                        let _ = writeln!(text, "{}) if that doesn't resolve the tie, {}.", i + 1, rule.describe());
                    }
                }
            }
        }
        text.push_str(
            "\nTies that remain after the last rule are decided by tiebreaker game(s), which are not \
             represented here. Those teams share a rank, which leads to an uneven distribution of the places.\n",
        );
        text
    }

    fn shortfall_line(&self) -> Option<String> {
        let summary = self.summary;
        if summary.shortfalls().is_empty() {
            return None;
        }
        Some(format!(
            "> Warning: only {} of {} scenarios were counted ({} failed, {} cancelled), so totals fall short of {}.",
            summary.completed,
            summary.scenarios,
            summary.failed,
            summary.cancelled,
            thousands(summary.scenarios)
        ))
    }

    pub fn to_markdown(&self) -> String {
        let ranks = self.rank_columns();
        let aggregate = self.aggregate();
        let rank_header: String = (1..=ranks).map(|r| format!(" {} |", r)).collect();
        let separator: String = " --- |".repeat(ranks + 2);

        let mut out = String::new();
        out.push_str(&self.explanation());
        if let Some(line) = self.shortfall_line() {
            let _ = writeln!(out, "\n{}", line);
        }

        let _ = writeln!(out, "\n## Relative:");
        let _ = writeln!(out, "| Team |{} Playoff % |", rank_header);
        let _ = writeln!(out, "|{}", separator);
        for team in self.sorted_teams() {
            let cells: String = (1..=ranks as u32)
                .map(|rank| format!(" {:.2} |", aggregate.percentage(team, rank)))
                .collect();
            let _ = writeln!(
                out,
                "| {} |{} {:.2} |",
                team,
                cells,
                aggregate.playoff_percentage(team, self.playoff_slots)
            );
        }

        let _ = writeln!(out, "\n## Absolute:");
        let _ = writeln!(out, "| Team |{} Total |", rank_header);
        let _ = writeln!(out, "|{}", separator);
        for team in self.sorted_teams() {
            let cells: String = aggregate
                .count_vector(team, ranks)
                .into_iter()
                .map(|count| format!(" {} |", thousands(count)))
                .collect();
            let _ = writeln!(out, "| {} |{} {} |", team, cells, thousands(aggregate.total_for(team)));
        }

        let _ = writeln!(out, "\nProcess Time: {:.2}s", self.summary.elapsed.as_secs_f64());
        out
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let ranks = self.rank_columns();
        let aggregate = self.aggregate();
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = vec!["team".to_string()];
        header.extend((1..=ranks).map(|r| format!("rank_{}", r)));
        header.push("total".to_string());
        header.push("playoff_pct".to_string());
        wtr.write_record(&header)?;

        for team in self.sorted_teams() {
            let mut row = vec![team.to_string()];
            row.extend(aggregate.count_vector(team, ranks).iter().map(|c| c.to_string()));
            row.push(aggregate.total_for(team).to_string());
            row.push(format!("{:.2}", aggregate.playoff_percentage(team, self.playoff_slots)));
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        self.aggregate().to_json()
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Markdown => Ok(self.to_markdown()),
            ReportFormat::Json => self.to_json(),
            ReportFormat::Csv => {
                let mut buf = Vec::new();
                self.write_csv(&mut buf)?;
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
        }
    }

    pub fn write_to_file(&self, path: &Path, format: ReportFormat) -> Result<()> {
        fs::write(path, self.render(format)?)?;
        log::info!("Output probabilities at '{}'", path.display());
        Ok(())
    }
}

/// 1234567 -> "1,234,567"
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
