use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory holding one subdirectory per task. Resolved by the loader when unset.
    #[serde(default)]
    pub tasks_dir: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tasks_dir: None,
            logging: LoggingConfig::default(),
            executor: ExecutorConfig::default(),
            worker: WorkerConfig::default(),
            http_server: HttpServerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn tasks_root(&self) -> PathBuf {
        match self
            .tasks_dir
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(dir) => PathBuf::from(dir),
            None => std::env::temp_dir().join("agentbox").join("tasks"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "agentbox_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Wall-clock bound for a single command or script step.
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// Bytes retained per stream (stdout, stderr); older output is truncated.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    /// How long to wait for pipe readers after the child exited or was killed.
    #[serde(default = "default_io_capture_timeout_ms")]
    pub io_capture_timeout_ms: u64,

    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default = "default_python_bin")]
    pub python_bin: String,

    #[serde(default = "default_node_bin")]
    pub node_bin: String,

    /// GUI automation tool prefixed to `simulate_gui` commands.
    #[serde(default = "default_gui_tool")]
    pub gui_tool: String,
}

fn default_step_timeout_secs() -> u64 {
    30
}

fn default_capture_bytes() -> usize {
    1024 * 1024
}

fn default_io_capture_timeout_ms() -> u64 {
    2_000
}

fn default_shell() -> String {
    "sh".to_string()
}

fn default_python_bin() -> String {
    "python3".to_string()
}

fn default_node_bin() -> String {
    "node".to_string()
}

fn default_gui_tool() -> String {
    "xdotool".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: default_step_timeout_secs(),
            capture_bytes: default_capture_bytes(),
            io_capture_timeout_ms: default_io_capture_timeout_ms(),
            shell: default_shell(),
            python_bin: default_python_bin(),
            node_bin: default_node_bin(),
            gui_tool: default_gui_tool(),
        }
    }
}

impl ExecutorConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs.max(1))
    }

    pub fn io_capture_timeout(&self) -> Duration {
        Duration::from_millis(self.io_capture_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Tasks executing at the same time; further tasks wait in the queue.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8000
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}
