use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One executable action. The vocabulary is closed: adding a kind means adding a
/// variant here and a match arm in the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum Step {
    Shell {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
    },
    Python {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
    },
    Typescript {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
    },
    WriteFile {
        path: String,
        content: String,
    },
    ReadFile {
        path: String,
    },
    SimulateGui {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
    },
}

impl Step {
    pub const KINDS: [&'static str; 6] = [
        "shell",
        "python",
        "typescript",
        "write_file",
        "read_file",
        "simulate_gui",
    ];

    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Shell { .. } => "shell",
            Self::Python { .. } => "python",
            Self::Typescript { .. } => "typescript",
            Self::WriteFile { .. } => "write_file",
            Self::ReadFile { .. } => "read_file",
            Self::SimulateGui { .. } => "simulate_gui",
        }
    }

    /// Per-step timeout override, if the step kind runs a process and declares one.
    pub fn timeout_secs(&self) -> Option<u64> {
        match self {
            Self::Shell { timeout_secs, .. }
            | Self::Python { timeout_secs, .. }
            | Self::Typescript { timeout_secs, .. }
            | Self::SimulateGui { timeout_secs, .. } => *timeout_secs,
            Self::WriteFile { .. } | Self::ReadFile { .. } => None,
        }
    }
}

/// A step as submitted. Unknown tools and ill-formed steps are kept so that they
/// fail at dispatch time instead of rejecting the whole task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StepEntry {
    Step(Step),
    Unknown {
        tool: String,
    },
    Malformed {
        #[serde(skip_serializing_if = "Option::is_none")]
        tool: Option<String>,
        reason: String,
    },
}

impl StepEntry {
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::Malformed {
                tool: None,
                reason: "step must be a JSON object".into(),
            };
        }
        let tool = match value.get("tool") {
            Some(Value::String(tool)) => tool.clone(),
            Some(_) => {
                return Self::Malformed {
                    tool: None,
                    reason: "'tool' must be a string".into(),
                }
            }
            None => {
                return Self::Malformed {
                    tool: None,
                    reason: "step is missing 'tool'".into(),
                }
            }
        };
        if !Step::KINDS.contains(&tool.as_str()) {
            return Self::Unknown { tool };
        }
        match serde_json::from_value::<Step>(value) {
            Ok(step) => Self::Step(step),
            Err(e) => Self::Malformed {
                tool: Some(tool),
                reason: e.to_string(),
            },
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            Self::Step(step) => step.tool_name(),
            Self::Unknown { tool } => tool,
            Self::Malformed { tool, .. } => tool.as_deref().unwrap_or("<missing>"),
        }
    }
}

impl From<Step> for StepEntry {
    fn from(step: Step) -> Self {
        Self::Step(step)
    }
}

impl<'de> Deserialize<'de> for StepEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}
