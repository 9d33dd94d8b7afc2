use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-project override file, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "project.toml";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub project: ProjectConfig,
    pub tool: ToolConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Platform id passed to plugman as `--platform`.
    pub platform: String,
    pub plugins_subdir: String,
    /// Exact file name that marks a directory as a plugin unit.
    pub descriptor: String,
}

#[derive(Debug, Deserialize)]
pub struct ToolConfig {
    pub path: String,
    /// Interpreter the tool is launched through. Empty means exec directly.
    #[serde(default)]
    pub runner: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    pub global_fetch_dir: String,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config → project file.
    pub fn load(project_root: &Path) -> Result<Self> {
        let mut layers = vec![include_str!("../../config/default.toml").to_string()];

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "plugin-orchestrator") {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                layers.push(
                    fs::read_to_string(&config_path)
                        .with_context(|| format!("reading {}", config_path.display()))?,
                );
            }
        }

        let project_path = project_root.join(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            layers.push(
                fs::read_to_string(&project_path)
                    .with_context(|| format!("reading {}", project_path.display()))?,
            );
        }

        Self::from_layers(&layers)
    }

    /// Deep-merge TOML documents in order, later ones winning key by key.
    pub fn from_layers<S: AsRef<str>>(layers: &[S]) -> Result<Self> {
        let mut merged = toml::Table::new();
        for layer in layers {
            let table: toml::Table = toml::from_str(layer.as_ref())?;
            merge_tables(&mut merged, table);
        }

        let config: AppConfig = toml::Value::Table(merged).try_into()?;
        if config.project.descriptor.trim().is_empty() {
            return Err(anyhow!("project.descriptor cannot be empty"));
        }
        Ok(config)
    }

    pub fn global_root(&self, project_root: &Path) -> Result<PathBuf> {
        resolve_path(&self.cache.global_fetch_dir, project_root)
    }

    pub fn local_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.project.plugins_subdir)
    }

    pub fn tool_path(&self, project_root: &Path) -> Result<PathBuf> {
        resolve_path(&self.tool.path, project_root)
    }

    pub fn runner(&self) -> Option<&str> {
        let runner = self.tool.runner.trim();
        (!runner.is_empty()).then_some(runner)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.tool.timeout_secs)
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// Expand `~` and anchor relative paths at the project root.
fn resolve_path(raw: &str, project_root: &Path) -> Result<PathBuf> {
    let expanded = if raw.starts_with('~') {
        let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
        PathBuf::from(raw.replacen('~', &home.to_string_lossy(), 1))
    } else {
        PathBuf::from(raw)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(project_root.join(expanded))
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: &str = include_str!("../../config/default.toml");

    #[test]
    fn defaults_parse() {
        let config = AppConfig::from_layers(&[DEFAULTS]).unwrap();
        assert_eq!(config.project.platform, "blackberry10");
        assert_eq!(config.project.descriptor, "plugin.xml");
        assert_eq!(config.runner(), Some("node"));
        assert_eq!(config.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn later_layers_override_single_keys() {
        let overlay = "[tool]\ntimeout_secs = 5\nrunner = \"\"\n";
        let config = AppConfig::from_layers(&[DEFAULTS, overlay]).unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.runner(), None);
        // untouched siblings survive the merge
        assert_eq!(config.tool.path, "cordova/node_modules/plugman/main.js");
        assert_eq!(config.project.plugins_subdir, "plugins");
    }

    #[test]
    fn relative_paths_anchor_at_project_root() {
        let overlay = "[cache]\nglobal_fetch_dir = \"shared/plugins\"\n";
        let config = AppConfig::from_layers(&[DEFAULTS, overlay]).unwrap();
        let project = Path::new("/work/app");

        assert_eq!(
            config.global_root(project).unwrap(),
            PathBuf::from("/work/app/shared/plugins")
        );
        assert_eq!(config.local_root(project), PathBuf::from("/work/app/plugins"));
        assert_eq!(
            config.tool_path(project).unwrap(),
            PathBuf::from("/work/app/cordova/node_modules/plugman/main.js")
        );
    }

    #[test]
    fn absolute_paths_are_kept() {
        let overlay = "[cache]\nglobal_fetch_dir = \"/opt/plugins\"\n";
        let config = AppConfig::from_layers(&[DEFAULTS, overlay]).unwrap();
        assert_eq!(
            config.global_root(Path::new("/work/app")).unwrap(),
            PathBuf::from("/opt/plugins")
        );
    }

    #[test]
    fn empty_descriptor_is_rejected() {
        let overlay = "[project]\ndescriptor = \" \"\n";
        assert!(AppConfig::from_layers(&[DEFAULTS, overlay]).is_err());
    }
}
