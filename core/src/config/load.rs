use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default agentbox data directory: ~/.agentbox
pub fn get_agentbox_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".agentbox"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let mut cfg = toml::from_str::<AppConfig>(&s)?;
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.agentbox/config.toml (highest)
    let data_dir = get_agentbox_data_dir()?;
    let home_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if home_config.exists() {
        let s = std::fs::read_to_string(&home_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    if cfg
        .tasks_dir
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        cfg.tasks_dir = Some(data_dir.join("tasks").to_string_lossy().to_string());
    }

    if cfg
        .logging
        .directory
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

// Environment variable overrides (Priority 0: highest)
fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Some(v) = env_non_empty("AGENTBOX_TASKS_DIR") {
        cfg.tasks_dir = Some(v);
    }
    if let Some(v) = env_non_empty("AGENTBOX_STEP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        cfg.executor.step_timeout_secs = v;
    }
    if let Some(v) = env_non_empty("AGENTBOX_MAX_CONCURRENCY").and_then(|v| v.parse().ok()) {
        cfg.worker.max_concurrency = v;
    }
    if let Some(v) = env_non_empty("AGENTBOX_HTTP_PORT").and_then(|v| v.parse().ok()) {
        cfg.http_server.port = v;
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
