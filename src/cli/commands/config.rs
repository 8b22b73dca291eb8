//! Config command implementation.
//!
//! The `testchain config` command shows the effective configuration.

use std::path::{Path, PathBuf};

use crate::cli::args::ConfigArgs;
use crate::config::{find_config, ChainConfig};
use crate::error::{ChainError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The config command implementation.
pub struct ConfigCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: ConfigArgs,
    config: ChainConfig,
}

impl ConfigCommand {
    /// Create a new config command for an already loaded configuration.
    pub fn new(
        project_root: &Path,
        config_override: Option<PathBuf>,
        args: ConfigArgs,
        config: ChainConfig,
    ) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override,
            args,
            config,
        }
    }

    fn source(&self) -> Option<PathBuf> {
        self.config_override
            .clone()
            .or_else(|| find_config(&self.project_root))
    }
}

impl Command for ConfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if self.args.json {
            let json = serde_json::to_string_pretty(&self.config)
                .map_err(|e| ChainError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        match self.source() {
            Some(path) => ui.message(&format!("# {}", path.display())),
            None => ui.message("# defaults (no config file)"),
        }
        let yaml = serde_yaml::to_string(&self.config).map_err(|e| ChainError::Other(e.into()))?;
        ui.message(&yaml);

        Ok(CommandResult::success())
    }
}
