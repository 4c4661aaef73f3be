//! Diagnostics command.

use anyhow::Result;
use colored::Colorize;
use cortex_core::{Config, HttpGateway, MemoryGateway};

pub async fn execute(config: &Config) -> Result<()> {
    println!("{}", "cortex Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check config file
    print!("  Config file: ");
    let config_path = Config::default_path();
    if config_path.exists() {
        println!("{} {}", "✓".green(), config_path.display());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check data directory
    print!("  Data directory: ");
    if Config::data_dir().exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not created yet".yellow());
    }

    // Check memory gateway
    print!("  Gateway ({}): ", config.gateway.url);
    match HttpGateway::new(&config.gateway) {
        Ok(gateway) => match gateway.health().await {
            Ok(health) => println!(
                "{} {} ({} memories)",
                "✓".green(),
                health.status.green(),
                health.total_memories
            ),
            Err(e) => {
                println!("{}", format!("✗ {}", e).red());
                issues.push("Cannot reach the memory gateway - is it running?");
            }
        },
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            issues.push("Failed to create the gateway client");
        }
    }

    // Delegated extraction
    print!("  Swarm extraction: ");
    if config.swarm.enabled {
        let key = if std::env::var(&config.swarm.api_key_env).is_ok() {
            "key set".green()
        } else {
            format!("{} unset", config.swarm.api_key_env).yellow()
        };
        println!("{} {} at {} ({})", "✓".green(), config.swarm.model, config.swarm.url, key);
    } else {
        println!("{}", "○ disabled (local extraction)".dimmed());
    }

    println!();
    if issues.is_empty() {
        println!("{}", "All checks passed!".green().bold());
    } else {
        println!("{}", "Issues found:".red().bold());
        for issue in &issues {
            println!("  {} {}", "•".red(), issue);
        }
    }

    Ok(())
}
