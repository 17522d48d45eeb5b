//! Error types for mounting and configuring games
//!
//! Nothing inside a tick returns an error; ticks clamp and guard instead.

use thiserror::Error;

/// Errors raised outside the simulation loop
#[derive(Debug, Error)]
pub enum ArcadeError {
    /// Canvas or 2D context missing
    #[error("Drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// No game registered under this id
    #[error("Unknown game: {0}")]
    UnknownGame(String),

    /// Embedded game data failed to parse
    #[error("Invalid game data for {game}: {source}")]
    InvalidConfig {
        game: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Settings JSON from the host page failed to parse
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),

    /// Game cannot run on the detected device
    #[error("{0} is not available on this device")]
    Unsupported(String),

    /// Host refused a frame or interval request
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

pub type Result<T> = std::result::Result<T, ArcadeError>;

#[cfg(target_arch = "wasm32")]
impl From<ArcadeError> for wasm_bindgen::JsValue {
    fn from(err: ArcadeError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
