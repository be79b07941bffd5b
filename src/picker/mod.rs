mod builtin;
mod external;

pub use builtin::BuiltinPicker;
pub use external::ExternalPicker;

use anyhow::Result;

use crate::config::{PickerConfig, PickerKind};

/// Interactive filter over a list of lines.
#[allow(async_fn_in_trait)]
pub trait InteractivePicker {
    /// The chosen line, or `None` when the user cancelled.
    async fn pick(&self, candidates: &[String]) -> Result<Option<String>>;
}

/// The picker selected by configuration.
pub enum ConfiguredPicker {
    External(ExternalPicker),
    Builtin(BuiltinPicker),
}

impl ConfiguredPicker {
    /// Build the configured picker, falling back to the built-in one when
    /// the external program is not installed.
    pub fn from_config(config: &PickerConfig) -> Self {
        match config.kind {
            PickerKind::Builtin => Self::Builtin(BuiltinPicker),
            PickerKind::External => {
                let external = ExternalPicker::new(config.command.clone());
                if external.is_available() {
                    Self::External(external)
                } else {
                    tracing::warn!(
                        program = external.program(),
                        "Picker not found in PATH, using built-in picker"
                    );
                    Self::Builtin(BuiltinPicker)
                }
            }
        }
    }
}

impl InteractivePicker for ConfiguredPicker {
    async fn pick(&self, candidates: &[String]) -> Result<Option<String>> {
        match self {
            ConfiguredPicker::External(p) => p.pick(candidates).await,
            ConfiguredPicker::Builtin(p) => p.pick(candidates).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_falls_back_to_builtin() {
        let config = PickerConfig {
            kind: PickerKind::External,
            command: vec!["/nonexistent/muxpick-fzf".to_string()],
        };
        assert!(matches!(
            ConfiguredPicker::from_config(&config),
            ConfiguredPicker::Builtin(_)
        ));
    }

    #[test]
    fn test_builtin_kind() {
        let config = PickerConfig {
            kind: PickerKind::Builtin,
            command: Vec::new(),
        };
        assert!(matches!(
            ConfiguredPicker::from_config(&config),
            ConfiguredPicker::Builtin(_)
        ));
    }
}
