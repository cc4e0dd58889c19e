//! Categorize, show and related commands

use colored::Colorize;
use repo_core::ConfigManager;
use repo_fs::DirectorySource;
use serde_json::json;

use crate::error::Result;

/// Run the categorize command
pub fn run_categorize(
    manager: &ConfigManager<DirectorySource>,
    repo: &str,
    path: &str,
    version: Option<&str>,
    json: bool,
) -> Result<()> {
    let info = manager.module_info(repo, path, version)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let result = &info.categorization;
    match &result.best_match {
        Some(category) => {
            println!(
                "{} {} ({})",
                result.path.bold(),
                category.green().bold(),
                result.module_type.as_deref().unwrap_or_default()
            );
            if let Some(name) = &info.module_name {
                println!("  {:<12} {}", "module:".dimmed(), name.cyan());
            }
            println!("  {:<12} {:.2}", "confidence:".dimmed(), result.confidence);
            if result.categories.len() > 1 {
                println!("  {:<12} {}", "also:".dimmed(), result.categories.join(", "));
            }
        }
        None if result.excluded => {
            println!("{} {}", result.path.bold(), "excluded".yellow());
        }
        None => {
            println!("{} {}", result.path.bold(), "uncategorized".dimmed());
        }
    }

    let flags: Vec<&str> = [
        (result.is_core, "core"),
        (result.is_test, "test"),
        (result.is_doc, "docs"),
    ]
    .into_iter()
    .filter_map(|(set, label)| set.then_some(label))
    .collect();
    if !flags.is_empty() {
        println!("  {:<12} {}", "paths:".dimmed(), flags.join(", "));
    }

    Ok(())
}

/// Run the show command
pub fn run_show(
    manager: &ConfigManager<DirectorySource>,
    repo: &str,
    version: Option<&str>,
    json: bool,
) -> Result<()> {
    let resolved = manager.resolve(repo, version)?;
    let config = resolved.config();

    if json {
        let value = json!({
            "version": resolved.version(),
            "applied_overrides": resolved.applied_overrides(),
            "documents": resolved.chain(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} ({})", config.repo_name.bold(), config.repo_type.cyan());
    if let Some(description) = &config.description {
        println!("  {}", description.dimmed());
    }
    if let Some(version) = resolved.version() {
        let applied = if resolved.applied_overrides().is_empty() {
            "none".to_string()
        } else {
            resolved.applied_overrides().join(", ")
        };
        println!("  {:<12} {} (overrides: {})", "version:".dimmed(), version, applied);
    }
    println!();

    println!("{}:", "Module Categories".cyan().bold());
    for (key, category) in &config.module_categories {
        println!("  {:<24} {}", key.green(), category.display_name);
        for pattern in &category.patterns {
            println!(
                "    {:<8} {}",
                pattern.pattern_type.as_str().dimmed(),
                pattern.pattern
            );
        }
    }
    println!();

    println!("{}:", "Paths".cyan().bold());
    for (label, prefixes) in [
        ("core", &config.paths.core),
        ("test", &config.paths.test),
        ("docs", &config.paths.docs),
        ("exclude", &config.paths.exclude),
    ] {
        if !prefixes.is_empty() {
            println!("  {:<10} {}", label, prefixes.join(", "));
        }
    }

    Ok(())
}

/// Run the related command
pub fn run_related(manager: &ConfigManager<DirectorySource>, repo: &str) -> Result<()> {
    let related = manager.related_repositories(repo)?;

    if related.is_empty() {
        println!("No related repositories.");
        return Ok(());
    }

    for (target, kind) in related {
        println!("  {:<20} {}", kind.to_string().dimmed(), target.green());
    }
    Ok(())
}
