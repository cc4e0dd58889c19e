//! Validate command

use colored::Colorize;
use repo_core::EngineOptions;
use repo_fs::DirectorySource;
use repo_meta::{ConfigLoader, DocumentReport, validate_all};
use std::path::Path;

use crate::error::{CliError, Result};

/// Run the validate command
pub fn run_validate(config: &Path, options: &EngineOptions) -> Result<()> {
    let source = DirectorySource::new(config)?.with_max_document_bytes(options.max_document_bytes);
    let loader = ConfigLoader::new(source).with_max_depth(options.max_inheritance_depth);
    let reports = validate_all(&loader)?;

    println!("{}", "Validating layout documents".bold());
    println!();

    let mut failed = 0;
    for (document, report) in &reports {
        match report {
            DocumentReport::LoadFailed(reason) => {
                failed += 1;
                println!("  {} {}", "FAIL".red().bold(), document);
                println!("       {}", reason.red());
            }
            DocumentReport::Issues(issues) => {
                if report.is_ok() {
                    println!("  {}   {}", "OK".green().bold(), document);
                } else {
                    failed += 1;
                    println!("  {} {}", "FAIL".red().bold(), document);
                }
                for issue in issues {
                    let line = issue.to_string();
                    if issue.is_error() {
                        println!("       {}", line.red());
                    } else {
                        println!("       {}", line.yellow());
                    }
                }
            }
        }
    }

    println!();
    if failed > 0 {
        return Err(CliError::user(format!(
            "{failed} of {} documents failed validation",
            reports.len()
        )));
    }

    println!(
        "{} {} documents valid.",
        "Total:".dimmed(),
        reports.len()
    );
    Ok(())
}
