//! Config commands

use anyhow::bail;
use colored::Colorize;

use dynaform_core::config::KEYS;
use dynaform_core::DynaformConfig;

use crate::config::ConfigLocation;
use crate::ConfigCommands;

pub fn handle(action: ConfigCommands, location: &ConfigLocation) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Init { force } => {
            if location.path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", location.path.display());
            }
            let config = DynaformConfig {
                local_path: Some(location.default_local_path()),
                ..DynaformConfig::default()
            };
            location.save(&config)?;
            println!("Configuration initialized at {}", location.path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = location.load_file()?;
            config.set(&key, &value)?;
            location.save(&config)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let config = location.load_file()?.with_env_overrides()?;
            let value = config.get(&key)?;
            println!("{}: {}", key, display(&key, value));
        }
        ConfigCommands::List => {
            let config = location.load_file()?.with_env_overrides()?;
            println!("{}", location.path.display().to_string().dimmed());
            for key in KEYS {
                println!("{}: {}", key, display(key, config.get(key)?));
            }
        }
    }
    Ok(())
}

/// Secrets show their first 8 characters only
fn display(key: &str, value: Option<String>) -> String {
    match value {
        Some(v) if key == "firestore.api_key" => format!("{}****", v.chars().take(8).collect::<String>()),
        Some(v) => v,
        None => "(not set)".into(),
    }
}
