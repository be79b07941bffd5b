use std::path::PathBuf;

/// Classified failures that map onto distinct process exit codes.
///
/// Plumbing code returns `anyhow::Result`; these travel inside the
/// `anyhow::Error` and are recovered in `main` by downcasting.
#[derive(Debug, thiserror::Error)]
pub enum SessionizerError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The create branch was reached without a directory to root the session in.
    #[error("cannot create session '{name}': no project directory selected")]
    InvalidTargetState { name: String },

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("'{0}' is both a live session and an indexed directory")]
    AmbiguousCandidate(String),

    #[error("configuration error in {path}: {details}")]
    Config { path: PathBuf, details: String },
}

impl SessionizerError {
    pub fn external(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            SessionizerError::InvalidArguments(_) => 2,
            SessionizerError::InvalidTargetState { .. } => 3,
            SessionizerError::ExternalTool { .. } => 4,
            SessionizerError::AmbiguousCandidate(_) => 5,
            SessionizerError::Config { .. } => 6,
        }
    }
}

/// Exit code for an arbitrary error, falling back to 1 for unclassified ones.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SessionizerError>())
        .map(SessionizerError::exit_code)
        .unwrap_or(1)
}
