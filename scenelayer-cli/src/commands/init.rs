//! Init command - write a default configuration file.

use std::path::{Path, PathBuf};

use scenelayer::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run(config_path: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let path = config_path.unwrap_or_else(config_file_path);
    write_default(&path, force)?;

    println!("Wrote default configuration to {}", path.display());
    println!();
    println!("Edit the [service] section to point at another image server.");
    Ok(())
}

fn write_default(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
    } else if !ConfigFile::ensure_exists_at(path)? {
        return Err(CliError::ConfigExists(path.to_path_buf()));
    }
    Ok(())
}
