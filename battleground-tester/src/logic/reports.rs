use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::{PolicySummary, RunSummary};

#[derive(Serialize)]
struct JsonReport<'a> {
    policies: &'a [PolicySummary],
    runs: &'a [RunSummary],
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    summaries: &[PolicySummary],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Playthrough Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "======================".cyan())?;

    let total_runs: usize = summaries.iter().map(|s| s.runs).sum();
    let clean = summaries.iter().filter(|s| s.passed()).count();
    writeln!(writer, "Strategies: {}", summaries.len())?;
    writeln!(writer, "Runs: {total_runs}")?;
    writeln!(writer, "Clean strategies: {}", clean.to_string().green())?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for summary in summaries {
        let status = if summary.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(writer, "{} {}", status, summary.strategy.label().bold())?;
        writeln!(
            writer,
            "   Graduated: {}/{} ({:.1}%)  Dismissed: {}",
            summary.graduated,
            summary.runs,
            summary.graduation_rate(),
            summary.dismissed
        )?;
        writeln!(writer, "   Choices per run: {:.1}", summary.mean_choices)?;
        if let Some(gpa) = summary.mean_exam_gpa {
            writeln!(writer, "   Mean exam GPA: {gpa:.1}")?;
        }
        if !summary.violations.is_empty() {
            writeln!(writer, "   Violations:")?;
            for violation in &summary.violations {
                writeln!(writer, "     • {}", violation.red())?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn generate_json_report(
    writer: &mut dyn Write,
    summaries: &[PolicySummary],
    runs: &[RunSummary],
) -> Result<()> {
    let report = JsonReport {
        policies: summaries,
        runs,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report(writer: &mut dyn Write, summaries: &[PolicySummary]) -> Result<()> {
    writeln!(writer, "# Bachelors Battleground Playthrough Results\n")?;
    writeln!(
        writer,
        "| Strategy | Runs | Graduated | Dismissed | Mean exam GPA | Status |"
    )?;
    writeln!(writer, "|---|---|---|---|---|---|")?;
    for summary in summaries {
        let gpa = summary
            .mean_exam_gpa
            .map_or_else(|| "-".to_string(), |gpa| format!("{gpa:.1}"));
        let status = if summary.passed() { "✅" } else { "❌" };
        writeln!(
            writer,
            "| {} | {} | {} | {} | {gpa} | {status} |",
            summary.strategy.label(),
            summary.runs,
            summary.graduated,
            summary.dismissed
        )?;
    }

    let failing: Vec<&PolicySummary> = summaries.iter().filter(|s| !s.passed()).collect();
    if !failing.is_empty() {
        writeln!(writer, "\n## Violations\n")?;
        for summary in failing {
            for violation in &summary.violations {
                writeln!(writer, "- **{}**: {violation}", summary.strategy.label())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GameplayStrategy;

    fn summary(violations: Vec<String>) -> PolicySummary {
        PolicySummary {
            strategy: GameplayStrategy::Scholar,
            runs: 4,
            graduated: 3,
            dismissed: 1,
            mean_exam_gpa: Some(61.24),
            mean_choices: 12.5,
            violations,
        }
    }

    #[test]
    fn markdown_lists_rows_and_violations() {
        let mut out = Vec::new();
        generate_markdown_report(&mut out, &[summary(vec!["seed 3: boom".to_string()])])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("| Scholar | 4 | 3 | 1 | 61.2 | ❌ |"), "{text}");
        assert!(text.contains("- **Scholar**: seed 3: boom"));
    }

    #[test]
    fn json_report_is_parseable() {
        let mut out = Vec::new();
        generate_json_report(&mut out, &[summary(Vec::new())], &[]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["policies"][0]["strategy"], "scholar");
        assert_eq!(value["policies"][0]["graduated"], 3);
        assert!(value["runs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn console_report_mentions_each_strategy() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        generate_console_report(&mut out, &[summary(Vec::new())], Duration::from_millis(5))
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("✅ PASS Scholar"));
        assert!(text.contains("Graduated: 3/4 (75.0%)"));
    }
}
