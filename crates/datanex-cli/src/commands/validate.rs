//! Validate command - run quality checks and optionally clean the data.

use std::path::{Path, PathBuf};

use colored::Colorize;
use datanex::input::write_file;
use datanex::validation::CheckKind;
use datanex::{CleanStrategy, ValidationRule};

use super::{CommandResult, engine, print_json, score_colored};

pub fn run(
    file: PathBuf,
    config: Option<&Path>,
    rules: Option<PathBuf>,
    clean: Option<CleanStrategy>,
    output: Option<PathBuf>,
    json_output: bool,
) -> CommandResult {
    let datanex = engine(config)?;
    let rules = match rules {
        Some(path) => ValidationRule::load_all(path)?,
        None => Vec::new(),
    };

    let (dataset, source) = datanex.load(&file)?;
    let report = datanex.validate(&dataset, &rules);

    if json_output {
        print_json(&report)?;
    } else {
        println!(
            "{} {} ({} rows, {} columns)",
            "Validation of".cyan().bold(),
            source.file.white(),
            report.total_rows,
            report.total_columns
        );
        println!();

        println!("{}", "Issues by check:".yellow().bold());
        for kind in CheckKind::ALL {
            let count = report.issue_count(kind);
            let shown = if count == 0 {
                count.to_string().green()
            } else {
                count.to_string().red()
            };
            println!("  {:<10} {}", format!("{}:", kind.label()), shown);
        }
        println!();

        for (column, finding) in &report.nulls {
            println!(
                "  {} {}: {} nulls ({:.1}%)",
                "•".dimmed(),
                column.white(),
                finding.count,
                finding.percentage
            );
        }
        for (column, finding) in &report.outliers {
            println!(
                "  {} {}: {} outliers outside [{:.2}, {:.2}]",
                "•".dimmed(),
                column.white(),
                finding.count,
                finding.lower_bound,
                finding.upper_bound
            );
        }
        for (column, finding) in &report.pattern_violations {
            println!(
                "  {} {}: {} values not matching {}",
                "•".dimmed(),
                column.white(),
                finding.invalid_count,
                finding.expected_pattern
            );
        }
        for violation in &report.rule_violations {
            println!(
                "  {} rule {} on {}: {} violations",
                "•".dimmed(),
                violation.rule.white(),
                violation.column,
                violation.count
            );
        }
        for failure in &report.degraded {
            println!(
                "  {} {} skipped: {}",
                "!".yellow(),
                failure.check,
                failure.detail.dimmed()
            );
        }
        println!();

        println!(
            "Quality score: {}  ({} invalid rows)",
            score_colored(report.quality_score),
            report.invalid_count
        );
        if report.is_valid {
            println!("{}", "Dataset passes the quality threshold.".green());
        } else {
            println!("{}", "Dataset is below the quality threshold.".red());
        }
    }

    if let Some(strategy) = clean {
        let cleaned = datanex.clean(&dataset, &report, strategy)?;
        let target = output.unwrap_or_else(|| default_output(&file, "cleaned"));
        write_file(&cleaned, &target)?;
        eprintln!(
            "{} {} rows written to {} ({})",
            "✓".green(),
            cleaned.row_count(),
            target.display(),
            strategy
        );
    }

    Ok(())
}

/// `<stem>.<suffix>.<ext>` next to the input file.
pub fn default_output(file: &Path, suffix: &str) -> PathBuf {
    let stem = file.file_stem().unwrap_or_default().to_string_lossy();
    let ext = file
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    file.with_file_name(format!("{}.{}.{}", stem, suffix, ext))
}
