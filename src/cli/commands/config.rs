//! `srcc config` command - Configuration inspection
//!
//! Shows the effective layered configuration and where each layer lives.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{emit, load_config};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str, &str)] = &[
    (
        "default_stage",
        "SRCC_DEFAULT_STAGE",
        "Staging used when a record's staging cannot be parsed (unset = error)",
    ),
    (
        "survival_method",
        "SRCC_SURVIVAL_METHOD",
        "Survival estimator: simplified or kaplan-meier",
    ),
    (
        "default_format",
        "SRCC_FORMAT",
        "Default output format (yaml, json, tsv, csv, md)",
    ),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);

    if let Some(key) = &args.key {
        if !VALID_KEYS.iter().any(|(k, _, _)| k == key) {
            return Err(miette::miette!(
                help = "run `srcc config keys` to list valid keys",
                "unknown configuration key '{}'",
                key
            ));
        }
        return match get_config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if matches!(global.format, OutputFormat::Yaml | OutputFormat::Json) {
        return emit(&config, global.format);
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _, _) in VALID_KEYS {
        print_config_value(key, get_config_value(&config, key).as_deref());
    }

    if !global.quiet {
        println!();
        println!("{}", style("Config Sources (in priority order):").dim());
        println!("  1. Environment variables (SRCC_DEFAULT_STAGE, SRCC_SURVIVAL_METHOD, SRCC_FORMAT)");
        println!("  2. Project config (.srcc/config.yaml)");
        println!("  3. Global config (~/.config/srcc/config.yaml)");
    }
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    let global_path = Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))?;
    let project_path = Config::project_config_path(global.project.as_deref());

    println!("{}", style("Configuration file paths:").bold());
    println!();
    println!("  {} {}", style("Global:").cyan(), global_path.display());
    print_exists(global_path.exists());

    println!();
    match project_path {
        Some(path) => {
            println!("  {} {}", style("Project:").cyan(), path.display());
            print_exists(path.exists());
        }
        None => println!(
            "  {} {}",
            style("Project:").cyan(),
            style("(not in an SRCC project)").dim()
        ),
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, env, description) in VALID_KEYS {
        println!(
            "  {:<18} {:<22} {}",
            style(key).cyan(),
            style(env).yellow(),
            style(description).dim()
        );
    }
    Ok(())
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "default_stage" => config.default_stage.clone(),
        "survival_method" => config.survival_method.clone(),
        "default_format" => config.default_format.clone(),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    match value {
        Some(v) => println!("  {}: {}", style(key).cyan(), style(v).yellow()),
        None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
    }
}

fn print_exists(exists: bool) {
    if exists {
        println!("         {}", style("(exists)").green());
    } else {
        println!("         {}", style("(not created)").dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_is_readable() {
        let config = Config {
            default_stage: Some("T1N0M0".into()),
            survival_method: Some("kaplan-meier".into()),
            default_format: Some("json".into()),
        };
        for (key, _, _) in VALID_KEYS {
            assert!(get_config_value(&config, key).is_some(), "{key}");
        }
        assert_eq!(get_config_value(&config, "editor"), None);
    }
}
