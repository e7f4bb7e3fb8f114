//! Dedup command - find duplicate rows, then remove or merge them.

use std::path::{Path, PathBuf};

use colored::Colorize;
use datanex::dedup::GroupEvidence;
use datanex::input::write_file;
use datanex::{DedupMethod, KeepPolicy, MergeStrategy};

use super::validate::default_output;
use super::{CommandResult, engine, print_json};

/// Groups printed in human-readable mode.
const GROUPS_SHOWN: usize = 10;

pub struct DedupArgs {
    pub method: DedupMethod,
    pub threshold: Option<f64>,
    pub keep: Option<KeepPolicy>,
    pub merge: Option<MergeStrategy>,
    pub output: Option<PathBuf>,
}

pub fn run(file: PathBuf, config: Option<&Path>, args: DedupArgs, json_output: bool) -> CommandResult {
    let datanex = engine(config)?;
    let (dataset, source) = datanex.load(&file)?;

    let report = match args.threshold {
        Some(t) => datanex.find_duplicates_with_threshold(&dataset, args.method, t)?,
        None => datanex.find_duplicates(&dataset, args.method),
    };

    if json_output {
        print_json(&report)?;
    } else {
        println!(
            "{} {} using {} matching",
            "Duplicates in".cyan().bold(),
            source.file.white(),
            report.method.to_string().white().bold()
        );
        println!();
        println!("  Rows:            {}", report.original_count);
        println!("  Groups:          {}", report.groups.len().to_string().yellow());
        println!("  Duplicate rows:  {}", report.duplicates_found.to_string().yellow());
        println!("  Unique rows:     {}", report.unique_count.to_string().green());
        if let Some(breakdown) = &report.breakdown {
            for (method, count) in breakdown {
                println!("    {:<8} {}", method, count);
            }
        }
        if let Some(note) = &report.note {
            println!("  {} {}", "!".yellow(), note.dimmed());
        }

        if !report.groups.is_empty() {
            println!();
            for group in report.groups.iter().take(GROUPS_SHOWN) {
                let detail = match &group.evidence {
                    Some(GroupEvidence::Similarity { scores, .. }) => {
                        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
                        format!(" (min similarity {:.3})", min)
                    }
                    _ => String::new(),
                };
                println!(
                    "  {} rows {:?}{}",
                    group.method.to_string().dimmed(),
                    group.indices,
                    detail
                );
            }
            if report.groups.len() > GROUPS_SHOWN {
                println!("  ... and {} more groups", report.groups.len() - GROUPS_SHOWN);
            }
        }
    }

    let resolved = match (args.keep, args.merge) {
        (Some(keep), _) => Some((datanex.remove_duplicates(&dataset, &report, keep)?, "deduped")),
        (None, Some(strategy)) => {
            Some((datanex.merge_duplicates(&dataset, &report, strategy)?, "merged"))
        }
        (None, None) => None,
    };

    if let Some((result, suffix)) = resolved {
        let target = args.output.unwrap_or_else(|| default_output(&file, suffix));
        write_file(&result, &target)?;
        eprintln!(
            "{} {} rows written to {}",
            "✓".green(),
            result.row_count(),
            target.display()
        );
    }

    Ok(())
}
