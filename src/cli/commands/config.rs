use anyhow::{Context, Result};
use fleet::FleetConfig;
use std::path::PathBuf;

pub struct ConfigCommand {
    save: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn new(save: Option<PathBuf>) -> Self {
        Self { save }
    }

    pub fn execute(&self, config: &FleetConfig) -> Result<()> {
        let mut shown = config.clone();
        if shown.store.auth_token.is_some() {
            shown.store.auth_token = Some("********".to_string());
        }
        let rendered = toml::to_string_pretty(&shown).context("Failed to render configuration")?;
        println!("{rendered}");

        if let Some(path) = &self.save {
            config
                .save_to_file(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("💾 Saved to {}", path.display());
        }
        Ok(())
    }
}
