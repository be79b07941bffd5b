use anyhow::Result;

use super::MultiplexerControl;
use crate::config::BootstrapTemplate;
use crate::error::SessionizerError;
use crate::target::{is_valid_session_name, ResolvedTarget};

/// Where the multiplexer stands relative to the requested session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoMultiplexerProcess,
    MultiplexerRunningNoTargetSession,
    TargetSessionExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    /// Attach the current terminal (not inside a tmux client)
    Attach,
    /// Move the existing client (already inside tmux)
    Switch,
}

/// The command that finally lands the user in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalCommand {
    pub kind: SwitchKind,
    pub session: String,
    pub argv: Vec<String>,
    /// Whether this invocation created the session
    pub created: bool,
}

/// Decides between create, attach and switch for a resolved target.
pub struct SessionController<'a, M> {
    mux: &'a M,
    template: &'a BootstrapTemplate,
}

impl<'a, M: MultiplexerControl> SessionController<'a, M> {
    pub fn new(mux: &'a M, template: &'a BootstrapTemplate) -> Self {
        Self { mux, template }
    }

    pub async fn state(&self, name: &str) -> Result<SessionState> {
        if !self.mux.is_server_running().await {
            return Ok(SessionState::NoMultiplexerProcess);
        }
        if self.mux.has_session(name).await? {
            Ok(SessionState::TargetSessionExists)
        } else {
            Ok(SessionState::MultiplexerRunningNoTargetSession)
        }
    }

    /// Make sure the target session exists, then return the attach or switch command.
    pub async fn prepare(
        &self,
        target: &ResolvedTarget,
        inside_client: bool,
    ) -> Result<FinalCommand> {
        let name = target.name.as_str();
        // tmux would store a different name than the one we look up afterwards
        if !is_valid_session_name(name) {
            return Err(SessionizerError::InvalidArguments(format!(
                "invalid session name '{}'",
                name
            ))
            .into());
        }

        let state = self.state(name).await?;
        tracing::debug!(session = name, ?state, "Session state");

        let created = match state {
            SessionState::TargetSessionExists => false,
            SessionState::NoMultiplexerProcess | SessionState::MultiplexerRunningNoTargetSession => {
                let path = target
                    .path
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| SessionizerError::InvalidTargetState {
                        name: name.to_string(),
                    })?;
                self.create(name, path).await?;
                true
            }
        };

        let (kind, argv) = if inside_client {
            (SwitchKind::Switch, self.mux.switch_command(name))
        } else {
            (SwitchKind::Attach, self.mux.attach_command(name))
        };

        Ok(FinalCommand {
            kind,
            session: name.to_string(),
            argv,
            created,
        })
    }

    /// Create the session from the window template.
    ///
    /// A failure after the session exists kills it again.
    async fn create(&self, name: &str, path: &str) -> Result<()> {
        let Some((first, rest)) = self.template.windows.split_first() else {
            return Err(SessionizerError::Config {
                path: Default::default(),
                details: "bootstrap template has no windows".to_string(),
            }
            .into());
        };

        tracing::info!(session = name, path, "Creating session");
        self.mux.new_session(name, path, first).await?;

        let populated = async {
            for window in rest {
                self.mux.new_window(name, path, window).await?;
            }
            self.mux.select_window(name, &first.name).await
        }
        .await;

        if let Err(e) = populated {
            tracing::warn!(session = name, "Bootstrap failed, removing session");
            if let Err(kill_err) = self.mux.kill_session(name).await {
                tracing::warn!("Failed to remove half-built session: {}", kill_err);
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMux;

    fn template() -> BootstrapTemplate {
        BootstrapTemplate {
            windows: vec![
                crate::config::WindowSpec {
                    name: "code".to_string(),
                    command: Some("nvim".to_string()),
                },
                crate::config::WindowSpec::shell("bash"),
                crate::config::WindowSpec::shell("server"),
            ],
        }
    }

    #[tokio::test]
    async fn test_states() {
        let template = template();
        let mux = FakeMux::stopped();
        let controller = SessionController::new(&mux, &template);
        assert_eq!(controller.state("a").await.unwrap(), SessionState::NoMultiplexerProcess);

        let mux = FakeMux::with_sessions(&["a"]);
        let controller = SessionController::new(&mux, &template);
        assert_eq!(controller.state("a").await.unwrap(), SessionState::TargetSessionExists);
        assert_eq!(
            controller.state("b").await.unwrap(),
            SessionState::MultiplexerRunningNoTargetSession
        );
    }

    #[tokio::test]
    async fn test_creates_with_template_then_attaches() {
        let template = template();
        let mux = FakeMux::stopped();
        let controller = SessionController::new(&mux, &template);
        let target = ResolvedTarget::project("proj_b", "/home/u/projects/proj_b/");

        let cmd = controller.prepare(&target, false).await.unwrap();
        assert!(cmd.created);
        assert_eq!(cmd.kind, SwitchKind::Attach);
        assert_eq!(cmd.argv, ["tmux", "attach-session", "-t", "=proj_b"]);
        assert_eq!(
            mux.calls(),
            [
                "new-session proj_b /home/u/projects/proj_b/ code nvim",
                "new-window proj_b /home/u/projects/proj_b/ bash",
                "new-window proj_b /home/u/projects/proj_b/ server",
                "select-window proj_b code",
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_session_switches_without_creating() {
        let template = template();
        let mux = FakeMux::with_sessions(&["proj_a"]);
        let controller = SessionController::new(&mux, &template);

        let cmd = controller
            .prepare(&ResolvedTarget::session("proj_a"), true)
            .await
            .unwrap();
        assert!(!cmd.created);
        assert_eq!(cmd.kind, SwitchKind::Switch);
        assert_eq!(cmd.argv, ["tmux", "switch-client", "-t", "=proj_a"]);
        assert!(mux.calls().is_empty());
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let template = template();
        let mux = FakeMux::with_sessions(&[]);
        let controller = SessionController::new(&mux, &template);
        let target = ResolvedTarget::project("proj", "/p/proj/");

        assert!(controller.prepare(&target, false).await.unwrap().created);
        assert!(!controller.prepare(&target, false).await.unwrap().created);
        let creations = mux
            .calls()
            .iter()
            .filter(|c| c.starts_with("new-session"))
            .count();
        assert_eq!(creations, 1);
    }

    #[tokio::test]
    async fn test_create_without_path_is_invalid_target_state() {
        let template = template();
        let mux = FakeMux::with_sessions(&["other"]);
        let controller = SessionController::new(&mux, &template);

        let err = controller
            .prepare(&ResolvedTarget::session("gone"), false)
            .await
            .unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 3);
        assert!(mux.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_bootstrap_kills_session() {
        let template = template();
        let mux = FakeMux::with_sessions(&[]).failing_on("new-window");
        let controller = SessionController::new(&mux, &template);

        let err = controller
            .prepare(&ResolvedTarget::project("p", "/p/"), false)
            .await
            .unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 4);
        assert_eq!(mux.calls().last().map(String::as_str), Some("kill-session p"));
        assert!(mux.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_reserved_characters_rejected_before_any_command() {
        let template = template();
        let mux = FakeMux::stopped();
        let controller = SessionController::new(&mux, &template);

        for name in ["my.app", "a:b", ""] {
            let err = controller
                .prepare(&ResolvedTarget::project(name, "/p/"), false)
                .await
                .unwrap_err();
            assert_eq!(crate::error::exit_code_for(&err), 2);
        }
        assert!(mux.calls().is_empty());
        assert!(mux.sessions().is_empty());
    }
}
