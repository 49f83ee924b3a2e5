use std::fmt::{Display, Formatter};

/// When the execution engine runs the cleanup phase.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum CleanupMode {
    #[default]
    Always,
    Never,
    Pronto,
    OnSuccess,
    OnFailure,
}

impl CleanupMode {
    pub const ALL: [CleanupMode; 5] = [
        CleanupMode::Always,
        CleanupMode::Never,
        CleanupMode::Pronto,
        CleanupMode::OnSuccess,
        CleanupMode::OnFailure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::Pronto => "pronto",
            Self::OnSuccess => "on_success",
            Self::OnFailure => "on_failure",
        }
    }
}

impl Display for CleanupMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
