use std::fmt;

use serde::Serialize;
use serde_json::{Value, json};

pub const ENVELOPE_SCHEMA_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputModeSelectionError {
    pub explicit: OutputMode,
}

impl fmt::Display for OutputModeSelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conflicting output mode flags: --json requires --output json (got {})",
            self.explicit.as_str()
        )
    }
}

pub fn select_output_mode(
    explicit: Option<OutputMode>,
    json_flag: bool,
    default_mode: OutputMode,
) -> Result<OutputMode, OutputModeSelectionError> {
    match (explicit, json_flag) {
        (Some(mode), true) if mode != OutputMode::Json => {
            Err(OutputModeSelectionError { explicit: mode })
        }
        (Some(mode), _) => Ok(mode),
        (None, true) => Ok(OutputMode::Json),
        (None, false) => Ok(default_mode),
    }
}

pub fn build_success_envelope<T: Serialize>(
    command: &str,
    result: &T,
) -> Result<String, serde_json::Error> {
    let envelope = json!({
        "schema_version": ENVELOPE_SCHEMA_VERSION,
        "command": command,
        "ok": true,
        "result": serde_json::to_value(result)?,
    });
    serde_json::to_string(&envelope)
}

pub fn build_error_envelope(
    command: &str,
    code: &str,
    message: &str,
    kind: &str,
    exit_code: i32,
) -> String {
    let envelope = json!({
        "schema_version": ENVELOPE_SCHEMA_VERSION,
        "command": command,
        "ok": false,
        "error": {
            "code": code,
            "message": message,
            "details": { "kind": kind, "exit_code": exit_code },
        },
    });
    envelope_to_string(&envelope)
}

fn envelope_to_string(envelope: &Value) -> String {
    // A `Value` built from `json!` always serializes.
    serde_json::to_string(envelope).unwrap_or_default()
}
