use thiserror::Error;

/// Anomalies reported by the manager. None of them abort a frame: the
/// failing operation is logged and leaves state untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ManagerError {
    #[error("invalid zone index {index} ({count} zones)")]
    InvalidZone { index: usize, count: usize },

    #[error("invalid projector index {index} ({count} projectors)")]
    InvalidProjector { index: usize, count: usize },

    #[error("settings error: {0}")]
    Settings(String),
}
