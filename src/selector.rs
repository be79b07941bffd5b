use anyhow::Result;
use std::collections::BTreeSet;

use crate::config::AmbiguityPolicy;
use crate::error::SessionizerError;
use crate::indexer::DirectoryIndexer;
use crate::picker::InteractivePicker;
use crate::target::{sanitize_session_name, ResolvedTarget};
use crate::tmux::SessionRegistry;

/// Environment variable carrying the menu protocol phase (rofi script mode).
pub const MENU_SIGNAL_ENV: &str = "ROFI_RETV";

/// How the program was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// The menu asks for the candidate list
    List,
    /// The menu reports the user's pick as program arguments
    MenuSelection,
    /// Terminal invocation: positional arguments and the fuzzy picker
    Direct,
}

impl InvocationMode {
    /// Decode the menu signal. Values other than `0`/`1` (custom keybindings)
    /// count as a selection when text was passed, as a listing otherwise.
    pub fn from_signal(signal: Option<&str>, has_args: bool) -> Self {
        match signal.map(str::trim) {
            None => InvocationMode::Direct,
            Some("0") => InvocationMode::List,
            Some("1") => InvocationMode::MenuSelection,
            Some(_) if has_args => InvocationMode::MenuSelection,
            Some(_) => InvocationMode::List,
        }
    }

    pub fn from_env(has_args: bool) -> Self {
        let signal = std::env::var(MENU_SIGNAL_ENV).ok();
        Self::from_signal(signal.as_deref(), has_args)
    }
}

/// What the selector produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Lines to hand back to the menu
    Candidates(Vec<String>),
    Target(ResolvedTarget),
}

/// Live sessions first, then indexed directories not already listed.
pub fn candidate_list(sessions: &[String], dirs: &[String]) -> Vec<String> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    sessions
        .iter()
        .chain(dirs.iter())
        .map(String::as_str)
        .filter(|c| seen.insert(*c))
        .map(str::to_string)
        .collect()
}

/// Candidates that are textually both a live session and an indexed directory.
pub fn ambiguous_candidates<'a>(sessions: &'a [String], dirs: &[String]) -> Vec<&'a str> {
    let dirs: BTreeSet<&str> = dirs.iter().map(String::as_str).collect();
    sessions
        .iter()
        .map(String::as_str)
        .filter(|s| dirs.contains(s))
        .collect()
}

/// Turns the invocation into a candidate list or a resolved target.
pub struct Selector<'a, R, I, P> {
    mode: InvocationMode,
    registry: &'a R,
    indexer: &'a I,
    picker: &'a P,
    ambiguity: AmbiguityPolicy,
}

impl<'a, R, I, P> Selector<'a, R, I, P>
where
    R: SessionRegistry,
    I: DirectoryIndexer,
    P: InteractivePicker,
{
    pub fn new(mode: InvocationMode, registry: &'a R, indexer: &'a I, picker: &'a P) -> Self {
        Self {
            mode,
            registry,
            indexer,
            picker,
            ambiguity: AmbiguityPolicy::default(),
        }
    }

    pub fn with_ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity = policy;
        self
    }

    pub async fn select(&self, args: &[String]) -> Result<Selection> {
        let sessions = self.registry.list_session_names().await?;
        tracing::debug!(mode = ?self.mode, sessions = sessions.len(), "Selecting");

        match self.mode {
            InvocationMode::List => {
                let dirs = self.indexer.index();
                for name in ambiguous_candidates(&sessions, &dirs) {
                    tracing::warn!(candidate = name, "Candidate is both a session and a directory");
                }
                Ok(Selection::Candidates(candidate_list(&sessions, &dirs)))
            }
            InvocationMode::MenuSelection => {
                let picked = args.join(" ");
                self.resolve_menu_selection(&picked, &sessions)
                    .map(Selection::Target)
            }
            InvocationMode::Direct => self
                .resolve_direct(args, &sessions)
                .await
                .map(Selection::Target),
        }
    }

    /// Exact, case-sensitive session match wins; anything else is a directory.
    fn resolve_menu_selection(&self, picked: &str, sessions: &[String]) -> Result<ResolvedTarget> {
        if picked.is_empty() {
            return Ok(ResolvedTarget::cancelled());
        }

        if sessions.iter().any(|s| s == picked) {
            let dirs = self.indexer.index();
            if dirs.iter().any(|d| d == picked) {
                match self.ambiguity {
                    AmbiguityPolicy::SessionWins => {
                        tracing::warn!(candidate = picked, "Ambiguous candidate, using the session");
                    }
                    AmbiguityPolicy::Reject => {
                        return Err(SessionizerError::AmbiguousCandidate(picked.to_string()).into());
                    }
                }
            }
            return Ok(ResolvedTarget::session(picked));
        }

        target_from_path(picked)
    }

    async fn resolve_direct(&self, args: &[String], sessions: &[String]) -> Result<ResolvedTarget> {
        match args {
            [] => match self.pick_directory().await? {
                Some(path) => target_from_path(&path),
                None => Ok(ResolvedTarget::cancelled()),
            },
            [name] => {
                if name.is_empty() {
                    return Err(SessionizerError::InvalidArguments(
                        "session name is empty".to_string(),
                    )
                    .into());
                }
                let name = sanitize_session_name(name);
                if sessions.iter().any(|s| *s == name) {
                    return Ok(ResolvedTarget::session(name));
                }
                // Keep the given name; an empty pick leaves no path for the controller
                let path = self.pick_directory().await?;
                Ok(ResolvedTarget { name, path })
            }
            [name, path, rest @ ..] => {
                if name.is_empty() || path.is_empty() {
                    return Err(SessionizerError::InvalidArguments(
                        "expected non-empty <name> <path>".to_string(),
                    )
                    .into());
                }
                if !rest.is_empty() {
                    tracing::warn!(extra = ?rest, "Ignoring extra arguments");
                }
                Ok(ResolvedTarget::project(
                    sanitize_session_name(name),
                    path.as_str(),
                ))
            }
        }
    }

    async fn pick_directory(&self) -> Result<Option<String>> {
        let dirs = self.indexer.index();
        self.picker.pick(&dirs).await
    }
}

fn target_from_path(path: &str) -> Result<ResolvedTarget> {
    ResolvedTarget::from_path(path).ok_or_else(|| {
        SessionizerError::InvalidArguments(format!("cannot derive a session name from '{}'", path))
            .into()
    })
}
