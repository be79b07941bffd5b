use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::InteractivePicker;
use crate::error::SessionizerError;

/// Exit codes fzf uses for "no match" and "interrupted".
const CANCEL_CODES: &[i32] = &[1, 130];

/// Line picker run as a child process (fzf, sk, ...).
///
/// Candidates go to stdin, the choice comes back on stdout; the UI draws on the tty.
pub struct ExternalPicker {
    command: Vec<String>,
}

impl ExternalPicker {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("")
    }

    /// Whether the program can be found, either as a path or on `PATH`.
    pub fn is_available(&self) -> bool {
        let program = self.program();
        if program.is_empty() {
            return false;
        }
        if program.contains(std::path::MAIN_SEPARATOR) {
            return Path::new(program).is_file();
        }
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
            .unwrap_or(false)
    }
}

/// Interpret a picker's exit code and stdout.
fn parse_choice(code: Option<i32>, stdout: &str) -> Option<Option<String>> {
    match code {
        Some(0) => Some(
            stdout
                .lines()
                .next()
                .map(str::trim_end)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        ),
        Some(c) if CANCEL_CODES.contains(&c) => Some(None),
        _ => None,
    }
}

impl InteractivePicker for ExternalPicker {
    async fn pick(&self, candidates: &[String]) -> Result<Option<String>> {
        let program = self.program();
        tracing::debug!(program, count = candidates.len(), "Running picker");

        let mut child = Command::new(program)
            .args(self.command.iter().skip(1))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SessionizerError::external(program, e.to_string()))
            .with_context(|| format!("Failed to start picker {}", program))?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut input = candidates.join("\n");
            input.push('\n');
            // The picker may exit before reading everything
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(SessionizerError::external(program, e.to_string()).into());
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SessionizerError::external(program, e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_choice(output.status.code(), &stdout).ok_or_else(|| {
            SessionizerError::external(program, format!("exited with {}", output.status)).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(
            parse_choice(Some(0), "/home/u/projects/a/\n"),
            Some(Some("/home/u/projects/a/".to_string()))
        );
        assert_eq!(parse_choice(Some(0), ""), Some(None));
        assert_eq!(parse_choice(Some(1), ""), Some(None));
        assert_eq!(parse_choice(Some(130), ""), Some(None));
        assert_eq!(parse_choice(Some(2), ""), None);
        assert_eq!(parse_choice(None, ""), None);
    }

    #[test]
    fn test_availability() {
        assert!(!ExternalPicker::new(vec![]).is_available());
        assert!(!ExternalPicker::new(vec!["/nonexistent/picker".to_string()]).is_available());
        assert!(ExternalPicker::new(vec!["/bin/sh".to_string()]).is_available());
    }

    #[tokio::test]
    async fn test_picks_first_line_through_child_process() {
        let picker = ExternalPicker::new(vec!["head".to_string(), "-n".to_string(), "1".to_string()]);
        let candidates = vec!["/a/".to_string(), "/b/".to_string()];
        assert_eq!(picker.pick(&candidates).await.unwrap(), Some("/a/".to_string()));
    }

    #[tokio::test]
    async fn test_cancel_exit_code_is_empty_pick() {
        let picker = ExternalPicker::new(vec!["sh".to_string(), "-c".to_string(), "exit 130".to_string()]);
        assert_eq!(picker.pick(&["/a/".to_string()]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_exit_code_is_error() {
        let picker = ExternalPicker::new(vec!["sh".to_string(), "-c".to_string(), "exit 2".to_string()]);
        let err = picker.pick(&["/a/".to_string()]).await.unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 4);
    }
}
