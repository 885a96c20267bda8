use crate::state::Phase;
use thiserror::Error;

/// Failures surfaced by the viewer core.
///
/// None of these are fatal to the render loop: the controller logs them and
/// returns them to whoever raised the triggering event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    /// Immersive mode is not available on this device/browser.
    #[error("immersive session mode is not supported on this device")]
    SessionUnsupported,
    /// The user denied the session or the platform refused it.
    #[error("session request failed: {0}")]
    SessionRequestFailed(String),
    #[error("asset load failed: {0}")]
    AssetLoadFailed(String),
    /// An asynchronous completion arrived after the viewer was disposed.
    #[error("completion arrived after the viewer was disposed")]
    DisposalRace,
    #[error("{trigger} is not allowed while {phase:?}")]
    InvalidTransition { phase: Phase, trigger: &'static str },
    #[error("render surface error: {0}")]
    Surface(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
