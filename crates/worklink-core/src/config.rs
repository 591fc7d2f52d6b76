use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::telemetry::LogFormat;
use crate::transitions::UnblockPolicy;

/// Environment variable overriding the document path.
pub const STORE_ENV: &str = "WORKLINK_STORE";

/// Project config, read from `.worklink/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl StoreConfig {
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub unblock_policy: UnblockPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Diagram format name: `mermaid` or `dot`.
    #[serde(default = "default_export_format")]
    pub format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: default_export_format(),
        }
    }
}

/// Per-user config, read from `<config dir>/worklink/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub log_format: Option<LogFormat>,
}

/// Project and user settings merged with environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorklinkConfig {
    pub store: StoreConfig,
    pub workflow: WorkflowConfig,
    pub export: ExportConfig,
    pub log_format: Option<LogFormat>,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".worklink/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("worklink/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read the `WORKLINK_STORE` override, ignoring empty values.
#[must_use]
pub fn store_override_from_env() -> Option<PathBuf> {
    env::var_os(STORE_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Load and merge project and user config.
///
/// `store_override` (normally [`store_override_from_env`]) replaces the
/// configured document path.
pub fn resolve_config(project_root: &Path, store_override: Option<PathBuf>) -> Result<WorklinkConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;
    Ok(merge(project, user, store_override))
}

fn merge(project: ProjectConfig, user: UserConfig, store_override: Option<PathBuf>) -> WorklinkConfig {
    let mut store = project.store;
    if let Some(path) = store_override {
        store.path = path;
    }
    WorklinkConfig {
        store,
        workflow: project.workflow,
        export: project.export,
        log_format: user.log_format,
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".worklink/work-units.json")
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_export_format() -> String {
    "mermaid".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_project_config(root: &Path, content: &str) {
        let dir = root.join(".worklink");
        std::fs::create_dir_all(&dir).expect("create .worklink");
        std::fs::write(dir.join("config.toml"), content).expect("write config");
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.store.path, PathBuf::from(".worklink/work-units.json"));
        assert_eq!(cfg.store.lock_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.workflow.unblock_policy, UnblockPolicy::AllBlockersDone);
        assert_eq!(cfg.export.format, "mermaid");
    }

    #[test]
    fn project_config_overrides_sections() {
        let root = tempfile::tempdir().expect("tempdir");
        write_project_config(
            root.path(),
            r#"
[store]
path = "data/units.json"
lock_timeout_ms = 250

[workflow]
unblock_policy = "any-blocker-done"

[export]
format = "dot"
"#,
        );

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.store.path, PathBuf::from("data/units.json"));
        assert_eq!(cfg.store.lock_timeout_ms, 250);
        assert_eq!(cfg.workflow.unblock_policy, UnblockPolicy::AnyBlockerDone);
        assert_eq!(cfg.export.format, "dot");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        write_project_config(root.path(), "[store]\nlock_timeout_ms = 10\n");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.store.path, default_store_path());
        assert_eq!(cfg.store.lock_timeout_ms, 10);
    }

    #[test]
    fn invalid_project_config_names_the_file() {
        let root = tempfile::tempdir().expect("tempdir");
        write_project_config(root.path(), "[workflow]\nunblock_policy = \"never\"\n");
        let err = load_project_config(root.path()).expect_err("invalid policy");
        assert!(format!("{err:#}").contains("config.toml"), "err: {err:#}");
    }

    #[test]
    fn user_config_reads_log_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_format = \"json\"\n").expect("write");
        let cfg = load_user_config_from(&path).expect("load");
        assert_eq!(cfg.log_format, Some(LogFormat::Json));

        let missing = load_user_config_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(missing, UserConfig::default());
    }

    #[test]
    fn store_override_replaces_configured_path() {
        let project = ProjectConfig::default();
        let user = UserConfig {
            log_format: Some(LogFormat::Compact),
        };
        let cfg = merge(project, user, Some(PathBuf::from("/tmp/elsewhere.json")));
        assert_eq!(cfg.store.path, PathBuf::from("/tmp/elsewhere.json"));
        assert_eq!(cfg.store.lock_timeout_ms, 5_000);
        assert_eq!(cfg.log_format, Some(LogFormat::Compact));
    }

    #[test]
    fn merge_without_override_keeps_project_values() {
        let cfg = merge(ProjectConfig::default(), UserConfig::default(), None);
        assert_eq!(cfg, WorklinkConfig::default());
    }
}
