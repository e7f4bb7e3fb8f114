//! Profile command - inferred column types and completeness.

use std::path::{Path, PathBuf};

use colored::Colorize;

use super::{CommandResult, engine, print_json};

pub fn run(file: PathBuf, config: Option<&Path>, json_output: bool) -> CommandResult {
    let datanex = engine(config)?;
    let (dataset, source) = datanex.load(&file)?;
    let profile = dataset.profile();

    if json_output {
        let output = serde_json::json!({
            "source": source,
            "columns": profile,
        });
        return print_json(&output);
    }

    println!(
        "{} {} ({} rows, {} columns, delimiter {:?})",
        "Profile of".cyan().bold(),
        source.file.white(),
        source.row_count,
        source.column_count,
        source.delimiter
    );
    println!();
    println!(
        "  {:<24} {:<10} {:>8} {:>10} {:<12}",
        "column".bold(),
        "type".bold(),
        "nulls".bold(),
        "distinct".bold(),
        "semantic".bold()
    );
    for column in &profile {
        let nulls = format!("{:.1}%", column.null_ratio * 100.0);
        let nulls = if column.null_count > 0 {
            nulls.yellow()
        } else {
            nulls.normal()
        };
        println!(
            "  {:<24} {:<10} {:>8} {:>10} {:<12}",
            column.name,
            format!("{:?}", column.column_type).to_lowercase(),
            nulls,
            column.distinct_count,
            format!("{:?}", column.semantic_type).to_lowercase()
        );
    }

    Ok(())
}
