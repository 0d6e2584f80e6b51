use std::path::Path;

use anyhow::{Result, bail};
use stitch_config::{StitchConfig, validate_config};
use stitch_core::OutputFormat;

pub(crate) fn handle_config_show(explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = StitchConfig::load(explicit)?.redacted_for_display();

    match format {
        OutputFormat::Json => {
            let json_str = serde_json::to_string_pretty(&config)?;
            println!("{json_str}");
        }
        OutputFormat::Text => {
            let toml_str = toml::to_string_pretty(&config)?;
            print!("{toml_str}");
        }
    }
    Ok(())
}

pub(crate) fn handle_config_path(explicit: Option<&Path>) -> Result<()> {
    match explicit {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", StitchConfig::config_path()?.display()),
    }
    Ok(())
}

pub(crate) fn handle_config_validate(explicit: Option<&Path>) -> Result<()> {
    let config = StitchConfig::load(explicit)?;
    validate_config(&config)?;
    eprintln!("Configuration is valid");
    Ok(())
}

pub(crate) fn handle_config_init(force: bool) -> Result<()> {
    let path = StitchConfig::config_path()?;
    if path.exists() && !force {
        bail!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    let written = StitchConfig::save_default_template()?;
    eprintln!("Wrote default config to {}", written.display());
    Ok(())
}
