//! CLI Configuration
//!
//! Locates `~/.dynaform/config.toml` (or `config.<profile>.toml`) and loads
//! it with `DYNAFORM_*` environment overrides applied.

use anyhow::Context as _;
use dynaform_core::{DynaformConfig, StoreBackend};
use std::path::PathBuf;

const CONFIG_DIR: &str = ".dynaform";
const LOCAL_STORE_FILE: &str = "forms.json";

/// Resolved config file location
pub struct ConfigLocation {
    pub path: PathBuf,
    base_dir: PathBuf,
}

impl ConfigLocation {
    pub fn resolve(explicit: Option<PathBuf>, profile: Option<&str>) -> anyhow::Result<Self> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        Ok(Self::within(home.join(CONFIG_DIR), explicit, profile))
    }

    fn within(base_dir: PathBuf, explicit: Option<PathBuf>, profile: Option<&str>) -> Self {
        let path = explicit.unwrap_or_else(|| {
            let filename = match profile {
                Some(p) => format!("config.{}.toml", p),
                None => "config.toml".to_string(),
            };
            base_dir.join(filename)
        });
        Self { path, base_dir }
    }

    /// File content only, without environment overrides
    pub fn load_file(&self) -> anyhow::Result<DynaformConfig> {
        DynaformConfig::load(&self.path).with_context(|| format!("Loading {}", self.path.display()))
    }

    /// Effective configuration for running commands
    pub fn load(&self) -> anyhow::Result<DynaformConfig> {
        let mut config = self.load_file()?.with_env_overrides()?;
        if config.backend == StoreBackend::Local && config.local_path.is_none() {
            config.local_path = Some(self.default_local_path());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &DynaformConfig) -> anyhow::Result<()> {
        config.save(&self.path).with_context(|| format!("Writing {}", self.path.display()))
    }

    pub fn default_local_path(&self) -> PathBuf {
        self.base_dir.join(LOCAL_STORE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_file_name() {
        let location = ConfigLocation::within(PathBuf::from("/home/u/.dynaform"), None, Some("staging"));
        assert_eq!(location.path, PathBuf::from("/home/u/.dynaform/config.staging.toml"));

        let explicit = ConfigLocation::within(PathBuf::from("/home/u/.dynaform"), Some("/etc/df.toml".into()), Some("x"));
        assert_eq!(explicit.path, PathBuf::from("/etc/df.toml"));
    }

    #[test]
    fn test_missing_file_uses_local_default() {
        let dir = tempfile::tempdir().unwrap();
        let location = ConfigLocation::within(dir.path().to_path_buf(), None, None);

        let config = location.load_file().unwrap();
        assert_eq!(config, DynaformConfig::default());
        assert_eq!(location.default_local_path(), dir.path().join("forms.json"));
    }
}
