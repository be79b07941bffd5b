use anyhow::Result;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::LauncherConfig;
use crate::error::SessionizerError;
use crate::selector::InvocationMode;
use crate::tmux::FinalCommand;

/// Environment variable tmux sets inside its clients.
pub const TMUX_ENV: &str = "TMUX";

/// Where the process runs, as far as dispatching the final command goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchContext {
    /// Invoked by a graphical menu rather than a terminal
    pub from_menu: bool,
    /// Running inside a tmux client
    pub inside_client: bool,
}

impl LaunchContext {
    pub fn new(mode: InvocationMode, tmux_env: Option<&str>) -> Self {
        let from_menu = mode == InvocationMode::MenuSelection;
        // A menu process may inherit $TMUX but is never itself a client
        let inside_client = !from_menu && tmux_env.map_or(false, |v| !v.is_empty());
        Self {
            from_menu,
            inside_client,
        }
    }

    pub fn detect(mode: InvocationMode) -> Self {
        let tmux = std::env::var(TMUX_ENV).ok();
        Self::new(mode, tmux.as_deref())
    }
}

/// How the final command gets run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Run in this terminal and wait for it
    Exec(Vec<String>),
    /// Close the menu and run inside a new terminal window
    Relaunch {
        kill_menu: Option<Vec<String>>,
        terminal: Vec<String>,
    },
}

pub fn plan(ctx: LaunchContext, command: &FinalCommand, config: &LauncherConfig) -> Dispatch {
    if !ctx.from_menu {
        return Dispatch::Exec(command.argv.clone());
    }

    let kill_menu = (!config.menu_process.is_empty()).then(|| {
        vec![
            "pkill".to_string(),
            "-x".to_string(),
            config.menu_process.clone(),
        ]
    });
    let terminal = config
        .terminal
        .iter()
        .chain(command.argv.iter())
        .cloned()
        .collect();

    Dispatch::Relaunch {
        kill_menu,
        terminal,
    }
}

pub async fn dispatch(dispatch: &Dispatch) -> Result<()> {
    match dispatch {
        Dispatch::Exec(argv) => exec(argv).await,
        Dispatch::Relaunch {
            kill_menu,
            terminal,
        } => {
            if let Some(kill) = kill_menu {
                kill_menu_process(kill).await;
            }
            spawn_detached(terminal)
        }
    }
}

fn split(argv: &[String]) -> Result<(&String, &[String])> {
    argv.split_first()
        .ok_or_else(|| SessionizerError::InvalidArguments("empty command".to_string()).into())
}

async fn exec(argv: &[String]) -> Result<()> {
    let (program, args) = split(argv)?;
    tracing::info!(command = ?argv, "Handing over to tmux");

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| SessionizerError::external(program.as_str(), e.to_string()))?;

    if !status.success() {
        return Err(SessionizerError::external(program.as_str(), format!("exited with {}", status)).into());
    }
    Ok(())
}

/// Best effort; the menu may already be gone.
async fn kill_menu_process(argv: &[String]) {
    let Ok((program, args)) = split(argv) else {
        return;
    };
    match Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => tracing::debug!(command = ?argv, %status, "Closed menu"),
        Err(e) => tracing::warn!("Failed to close menu: {}", e),
    }
}

fn spawn_detached(argv: &[String]) -> Result<()> {
    let (program, args) = split(argv)?;
    tracing::info!(command = ?argv, "Opening terminal");

    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| SessionizerError::external(program.as_str(), e.to_string()))?;
    Ok(())
}
