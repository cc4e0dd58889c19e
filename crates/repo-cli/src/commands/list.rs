//! List command

use colored::Colorize;
use repo_core::ConfigManager;
use repo_fs::DirectorySource;

use crate::error::Result;

/// Run the list command
pub fn run_list(manager: &ConfigManager<DirectorySource>) -> Result<()> {
    let repositories = manager.repositories();

    println!("{}", "Known Repositories".bold());
    println!();
    for name in &repositories {
        match manager.get_repository(name) {
            Ok(resolved) => println!(
                "  {:<32} {}",
                name.green(),
                resolved.config().repo_type.dimmed()
            ),
            Err(e) => println!("  {:<32} {}", name.red(), e.to_string().red()),
        }
    }
    println!();
    println!(
        "{} {} repositories. Use {} to classify a file.",
        "Total:".dimmed(),
        repositories.len(),
        "repo-layout categorize <repo> <path>".cyan()
    );

    Ok(())
}
