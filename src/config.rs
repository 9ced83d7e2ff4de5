use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MeshConfig {
    pub database: Option<String>,
    /// Settings row that devices and groups are stamped with
    pub settings_id: Option<i64>,
    pub busy_timeout_ms: Option<u64>,
}

impl MeshConfig {
    /// Database path: explicit flag, then config, then the default under `base`
    pub fn resolve_database(&self, flag: Option<&Path>, base: &Path) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| default_database_path_in(base))
    }

    pub fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout_ms.map(Duration::from_millis)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("meshdb.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".meshdb").join("mesh.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<MeshConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: MeshConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &MeshConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
