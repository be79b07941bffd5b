use anyhow::{Context, Result};
use std::process::{Output, Stdio};
use tokio::process::Command;

use super::{MultiplexerControl, SessionRegistry};
use crate::config::WindowSpec;
use crate::error::SessionizerError;

/// Client for interacting with tmux via CLI
pub struct TmuxClient {
    /// Path to tmux binary
    tmux_path: String,
}

impl TmuxClient {
    pub fn with_binary(path: impl Into<String>) -> Self {
        Self {
            tmux_path: path.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!(args = ?args, "tmux");
        let output = Command::new(&self.tmux_path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SessionizerError::external(&self.tmux_path, e.to_string()))
            .with_context(|| format!("Failed to execute tmux {}", args.first().unwrap_or(&"")))?;
        Ok(output)
    }

    /// Run a command and fail on a non-zero exit, carrying tmux's stderr.
    async fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SessionizerError::external(
                format!("tmux {}", args.first().unwrap_or(&"")),
                stderr.trim().to_string(),
            )
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self::with_binary("tmux")
    }
}

/// Exact-match session target, so `foo` never resolves to `foobar`.
fn exact(name: &str) -> String {
    format!("={}", name)
}

fn parse_session_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn window_args<'a>(path: &'a str, window: &'a WindowSpec) -> Vec<&'a str> {
    let mut args = vec!["-c", path, "-n", window.name.as_str()];
    if let Some(cmd) = window.command.as_deref() {
        args.push(cmd);
    }
    args
}

impl SessionRegistry for TmuxClient {
    async fn list_session_names(&self) -> Result<Vec<String>> {
        let output = self
            .run(&["list-sessions", "-F", "#{session_name}"])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("no server running")
                || stderr.contains("no sessions")
                || stderr.contains("error connecting")
            {
                return Ok(Vec::new());
            }
            return Err(SessionizerError::external("tmux list-sessions", stderr.trim()).into());
        }

        Ok(parse_session_names(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl MultiplexerControl for TmuxClient {
    async fn is_server_running(&self) -> bool {
        Command::new(&self.tmux_path)
            .arg("list-sessions")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn has_session(&self, name: &str) -> Result<bool> {
        let target = exact(name);
        let output = self.run(&["has-session", "-t", &target]).await?;
        Ok(output.status.success())
    }

    async fn new_session(&self, name: &str, path: &str, window: &WindowSpec) -> Result<()> {
        let mut args = vec!["new-session", "-d", "-s", name];
        args.extend(window_args(path, window));
        self.run_checked(&args).await?;
        Ok(())
    }

    async fn new_window(&self, session: &str, path: &str, window: &WindowSpec) -> Result<()> {
        // Trailing colon: next free window index in that session
        let target = format!("{}:", exact(session));
        let mut args = vec!["new-window", "-t", target.as_str()];
        args.extend(window_args(path, window));
        self.run_checked(&args).await?;
        Ok(())
    }

    async fn select_window(&self, session: &str, window: &str) -> Result<()> {
        let target = format!("{}:{}", exact(session), window);
        self.run_checked(&["select-window", "-t", &target]).await?;
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<()> {
        let target = exact(name);
        self.run_checked(&["kill-session", "-t", &target]).await?;
        Ok(())
    }

    fn attach_command(&self, name: &str) -> Vec<String> {
        vec![
            self.tmux_path.clone(),
            "attach-session".to_string(),
            "-t".to_string(),
            exact(name),
        ]
    }

    fn switch_command(&self, name: &str) -> Vec<String> {
        vec![
            self.tmux_path.clone(),
            "switch-client".to_string(),
            "-t".to_string(),
            exact(name),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_names() {
        let out = "proj_a\nmy notes\n\n";
        assert_eq!(parse_session_names(out), vec!["proj_a", "my notes"]);
        assert!(parse_session_names("").is_empty());
    }

    #[test]
    fn test_window_args() {
        let code = WindowSpec {
            name: "code".to_string(),
            command: Some("nvim".to_string()),
        };
        assert_eq!(window_args("/p/", &code), ["-c", "/p/", "-n", "code", "nvim"]);
        assert_eq!(
            window_args("/p/", &WindowSpec::shell("bash")),
            ["-c", "/p/", "-n", "bash"]
        );
    }

    #[test]
    fn test_attach_and_switch_use_exact_targets() {
        let client = TmuxClient::with_binary("/opt/tmux");
        assert_eq!(
            client.attach_command("proj"),
            ["/opt/tmux", "attach-session", "-t", "=proj"]
        );
        assert_eq!(
            client.switch_command("proj"),
            ["/opt/tmux", "switch-client", "-t", "=proj"]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_external_failure() {
        let client = TmuxClient::with_binary("/nonexistent/muxpick-tmux");
        assert!(!client.is_server_running().await);
        let err = client.list_session_names().await.unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 4);
    }
}
