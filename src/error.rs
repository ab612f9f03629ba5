use thiserror::Error;

/// Failures the window manager reports to its caller. Everything else
/// (stale ids, undersized geometry) is corrected silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("unknown application id `{0}`")]
    UnknownApp(String),
}
