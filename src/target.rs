use std::path::Path;

/// The outcome of selection: which session to land in and, when it may
/// need creating, which directory to root it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Session name; empty only when the selection was cancelled
    pub name: String,
    /// Project directory; `None` for an existing session
    pub path: Option<String>,
}

impl ResolvedTarget {
    pub fn cancelled() -> Self {
        Self::default()
    }

    /// An existing session, attached to without creation.
    pub fn session(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }

    /// A project directory with an explicit session name.
    pub fn project(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }

    /// A project directory whose session name is derived from the path.
    ///
    /// Returns `None` when the path has no usable final component (e.g. `/`).
    pub fn from_path(path: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let name = derive_session_name(&path)?;
        Some(Self::project(name, path))
    }

    pub fn is_cancelled(&self) -> bool {
        self.name.is_empty() && self.path.as_deref().map_or(true, str::is_empty)
    }

    pub fn is_session_only(&self) -> bool {
        !self.name.is_empty() && self.path.is_none()
    }
}

/// Characters tmux rewrites to `_` in session names.
const RESERVED: &[char] = &['.', ':'];

/// Rewrite a session name the way tmux would store it.
pub fn sanitize_session_name(name: &str) -> String {
    name.replace(RESERVED, "_")
}

pub fn is_valid_session_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(RESERVED)
}

/// Derive a tmux session name from a directory path.
///
/// Takes the final path component and replaces `.` (and `:`) with `_`.
pub fn derive_session_name(path: &str) -> Option<String> {
    let base = Path::new(path).file_name()?.to_string_lossy();
    if base.is_empty() {
        return None;
    }
    Some(sanitize_session_name(&base))
}
