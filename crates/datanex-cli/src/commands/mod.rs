//! CLI command implementations.

pub mod dedup;
pub mod patterns;
pub mod profile;
pub mod validate;

use std::path::Path;

use colored::{ColoredString, Colorize};
use datanex::{Datanex, DatanexConfig};
use tracing::debug;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Build the engines from the optional config file.
pub fn engine(config: Option<&Path>) -> Result<Datanex, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => {
            debug!(path = %path.display(), "Loading config");
            DatanexConfig::load(path)?
        }
        None => DatanexConfig::default(),
    };
    Ok(Datanex::with_config(config))
}

/// Color a 0.0-1.0 score by how healthy it is.
pub fn score_colored(score: f64) -> ColoredString {
    let text = format!("{:.1}%", score * 100.0);
    if score >= 0.8 {
        text.green().bold()
    } else if score >= 0.6 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
