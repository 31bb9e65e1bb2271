use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A function tool declaration sent alongside a chat request. `parameters`
/// is the JSON-schema object the model's arguments must conform to.
#[derive(Clone, Debug, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Validation failure for model-produced tool arguments. Treated as an
/// untrusted-input rejection, never persisted around.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("missing required field `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{field}`: {detail}")]
    Invalid { field: &'static str, detail: String },
}

