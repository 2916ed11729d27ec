// Typed errors with thiserror. Surface meaningful messages to JS.
// Only the configuration and request boundary can fail; the animation core
// treats missing targets as silent no-ops.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown easing: {0}")]
    UnknownEasing(String),

    #[error("Invalid boundary '{0}', expected '<top|center|bottom> <N%|top|center|bottom>'")]
    InvalidBoundary(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Unknown animation context {0}")]
    UnknownContext(u32),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<EngineError> for JsValue {
    fn from(err: EngineError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
