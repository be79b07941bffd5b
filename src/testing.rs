//! In-memory stand-ins for the external collaborators.

use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::config::WindowSpec;
use crate::error::SessionizerError;
use crate::indexer::DirectoryIndexer;
use crate::picker::InteractivePicker;
use crate::tmux::{MultiplexerControl, SessionRegistry};

#[derive(Default)]
struct MuxState {
    running: bool,
    sessions: BTreeSet<String>,
    calls: Vec<String>,
}

/// Multiplexer that records every mutating command.
pub struct FakeMux {
    state: Mutex<MuxState>,
    fail_on: Option<&'static str>,
}

impl FakeMux {
    pub fn stopped() -> Self {
        Self {
            state: Mutex::new(MuxState::default()),
            fail_on: None,
        }
    }

    pub fn with_sessions(names: &[&str]) -> Self {
        Self {
            state: Mutex::new(MuxState {
                running: true,
                sessions: names.iter().map(|s| s.to_string()).collect(),
                calls: Vec::new(),
            }),
            fail_on: None,
        }
    }

    /// Make the named command fail as tmux would.
    pub fn failing_on(mut self, command: &'static str) -> Self {
        self.fail_on = Some(command);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn sessions(&self) -> Vec<String> {
        self.state.lock().unwrap().sessions.iter().cloned().collect()
    }

    fn record(&self, command: &'static str, detail: String) -> Result<()> {
        if self.fail_on == Some(command) {
            return Err(SessionizerError::external(format!("tmux {command}"), "boom").into());
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("{command} {detail}"));
        Ok(())
    }
}

fn describe(window: &WindowSpec) -> String {
    match &window.command {
        Some(cmd) => format!("{} {}", window.name, cmd),
        None => window.name.clone(),
    }
}

impl SessionRegistry for FakeMux {
    async fn list_session_names(&self) -> Result<Vec<String>> {
        Ok(self.sessions())
    }
}

impl MultiplexerControl for FakeMux {
    async fn is_server_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    async fn has_session(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().sessions.contains(name))
    }

    async fn new_session(&self, name: &str, path: &str, window: &WindowSpec) -> Result<()> {
        self.record("new-session", format!("{name} {path} {}", describe(window)))?;
        let mut state = self.state.lock().unwrap();
        state.running = true;
        state.sessions.insert(name.to_string());
        Ok(())
    }

    async fn new_window(&self, session: &str, path: &str, window: &WindowSpec) -> Result<()> {
        self.record("new-window", format!("{session} {path} {}", describe(window)))
    }

    async fn select_window(&self, session: &str, window: &str) -> Result<()> {
        self.record("select-window", format!("{session} {window}"))
    }

    async fn kill_session(&self, name: &str) -> Result<()> {
        self.record("kill-session", name.to_string())?;
        self.state.lock().unwrap().sessions.remove(name);
        Ok(())
    }

    fn attach_command(&self, name: &str) -> Vec<String> {
        ["tmux", "attach-session", "-t"]
            .iter()
            .map(|s| s.to_string())
            .chain([format!("={name}")])
            .collect()
    }

    fn switch_command(&self, name: &str) -> Vec<String> {
        ["tmux", "switch-client", "-t"]
            .iter()
            .map(|s| s.to_string())
            .chain([format!("={name}")])
            .collect()
    }
}

/// Picker that returns a canned answer and remembers what it was shown.
pub struct FakePicker {
    answer: Option<String>,
    shown: Mutex<Vec<Vec<String>>>,
}

impl FakePicker {
    pub fn picking(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn cancelling() -> Self {
        Self {
            answer: None,
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> usize {
        self.shown.lock().unwrap().len()
    }

    pub fn last_shown(&self) -> Option<Vec<String>> {
        self.shown.lock().unwrap().last().cloned()
    }
}

impl InteractivePicker for FakePicker {
    async fn pick(&self, candidates: &[String]) -> Result<Option<String>> {
        self.shown.lock().unwrap().push(candidates.to_vec());
        Ok(self.answer.clone())
    }
}

pub struct FakeIndexer(pub Vec<String>);

impl DirectoryIndexer for FakeIndexer {
    fn index(&self) -> Vec<String> {
        self.0.clone()
    }
}
