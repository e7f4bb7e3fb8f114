//! Patterns command - statistical pattern discovery.

use std::path::{Path, PathBuf};

use colored::Colorize;
use datanex::patterns::{ClusterResult, Significance};

use super::{CommandResult, engine, print_json};

pub fn run(
    file: PathBuf,
    config: Option<&Path>,
    dependencies: bool,
    distribution: bool,
    json_output: bool,
) -> CommandResult {
    let datanex = engine(config)?;
    let (dataset, source) = datanex.load(&file)?;

    let report = datanex.find_patterns(&dataset);
    let deps = dependencies.then(|| datanex.find_dependencies(&dataset));
    let dists = distribution.then(|| datanex.analyze_distribution(&dataset));

    if json_output {
        let output = serde_json::json!({
            "patterns": report,
            "dependencies": deps,
            "distribution": dists,
        });
        return print_json(&output);
    }

    println!("{} {}", "Patterns in".cyan().bold(), source.file.white());
    println!();

    if !report.correlations.is_empty() {
        println!("{}", "Correlations:".yellow().bold());
        for c in &report.correlations {
            println!(
                "  {} ~ {}: r = {:.3} ({:?}, {:?})",
                c.column1.white(),
                c.column2.white(),
                c.correlation,
                c.strength,
                c.kind
            );
        }
        println!();
    }

    if !report.trends.is_empty() {
        println!("{}", "Trends:".yellow().bold());
        for t in &report.trends {
            let sig = match t.significance {
                Significance::Significant => "significant".green(),
                Significance::NotSignificant => "not significant".dimmed(),
            };
            println!(
                "  {} over {}: {:?}, slope {:.4}, R² {:.3}, p {:.4} ({})",
                t.column.white(),
                t.date_column,
                t.trend,
                t.slope,
                t.r_squared,
                t.p_value,
                sig
            );
        }
        println!();
    }

    if !report.anomalies.is_empty() {
        println!("{}", "Anomalies:".yellow().bold());
        for a in &report.anomalies {
            println!(
                "  {}: {} values (mean {:.2}, std {:.2}) e.g. {:?}",
                a.column.white(),
                a.count.to_string().red(),
                a.mean,
                a.std,
                a.anomaly_values
            );
        }
        println!();
    }

    if !report.sequences.is_empty() {
        println!("{}", "Repeated sequences:".yellow().bold());
        for s in &report.sequences {
            let run: Vec<String> = s.sequence.iter().map(|v| v.to_string()).collect();
            println!("  {}: {} x{}", s.column.white(), run.join(" → "), s.count);
        }
        println!();
    }

    if !report.associations.is_empty() {
        println!("{}", "Associations:".yellow().bold());
        for a in &report.associations {
            println!("  {} & {}: support {:.2}", a.item1, a.item2, a.support);
        }
        println!();
    }

    match &report.clusters {
        ClusterResult::Projected(p) => println!(
            "{} {} components explain {:.1}% of variance over {} rows",
            "Projection:".yellow().bold(),
            p.components_used,
            p.total_variance_explained * 100.0,
            p.rows_used
        ),
        ClusterResult::InsufficientData { note, .. } => {
            println!("{} {}", "Projection:".yellow().bold(), note.dimmed())
        }
        ClusterResult::Failed { error } => {
            println!("{} {}", "Projection:".yellow().bold(), error.red())
        }
    }

    if let Some(deps) = deps {
        println!();
        println!("{}", "Functional dependencies:".yellow().bold());
        if deps.is_empty() {
            println!("  {}", "none".dimmed());
        }
        for d in deps {
            println!("  {} → {}", d.determinant.white(), d.dependent);
        }
    }

    if let Some(dists) = dists {
        println!();
        println!("{}", "Distributions:".yellow().bold());
        for (column, d) in dists {
            let normal = match d.is_normal {
                Some(true) => "normal".green(),
                Some(false) => "non-normal".yellow(),
                None => "untested".dimmed(),
            };
            println!(
                "  {}: mean {:.2}, median {:.2}, std {:.2}, skew {:.2}, kurtosis {:.2} ({})",
                column.white(),
                d.mean,
                d.median,
                d.std,
                d.skewness,
                d.kurtosis,
                normal
            );
        }
    }

    for failure in &report.degraded {
        println!(
            "{} {} skipped: {}",
            "!".yellow(),
            failure.analysis,
            failure.detail.dimmed()
        );
    }

    Ok(())
}
