mod client;
pub mod controller;

pub use client::TmuxClient;
pub use controller::{FinalCommand, SessionController};

use anyhow::Result;

use crate::config::WindowSpec;

/// Read-only view of the running multiplexer's sessions.
#[allow(async_fn_in_trait)]
pub trait SessionRegistry {
    /// Names of all live sessions. An absent server yields an empty list.
    async fn list_session_names(&self) -> Result<Vec<String>>;
}

/// Commands issued against the multiplexer.
#[allow(async_fn_in_trait)]
pub trait MultiplexerControl {
    /// Whether a server process is running at all
    async fn is_server_running(&self) -> bool;

    /// Whether a session with exactly this name exists
    async fn has_session(&self, name: &str) -> Result<bool>;

    /// Create a detached session whose first window is `window`
    async fn new_session(&self, name: &str, path: &str, window: &WindowSpec) -> Result<()>;

    /// Append a window to an existing session
    async fn new_window(&self, session: &str, path: &str, window: &WindowSpec) -> Result<()>;

    async fn select_window(&self, session: &str, window: &str) -> Result<()>;

    async fn kill_session(&self, name: &str) -> Result<()>;

    /// Argv that attaches the current terminal to a session
    fn attach_command(&self, name: &str) -> Vec<String>;

    /// Argv that moves the current client to a session
    fn switch_command(&self, name: &str) -> Vec<String>;
}
