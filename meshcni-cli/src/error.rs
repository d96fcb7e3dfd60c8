//! CLI-specific error types and exit code mapping

use meshcni_core::error::{MeshcniError, RedirectFailure};
use meshcni_redirect::RedirectError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// An annotation value was rejected by its field validator.
    #[error("annotation error: {0}")]
    Annotation(String),

    /// The redirect tool could not be started or exited with failure.
    #[error("redirect failed: {0}")]
    Redirect(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from meshcni-core.
    #[error("{0}")]
    Core(#[from] MeshcniError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 0    | Success                          |
    /// | 1    | General / command error          |
    /// | 2    | Configuration error              |
    /// | 3    | Annotation validation error      |
    /// | 4    | Redirect invocation failed       |
    /// | 10   | IO error                         |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Annotation(_) => 3,
            Self::Redirect(_) => 4,
            Self::Io(_) => 10,
            Self::Core(core) => match core {
                MeshcniError::Config(_) => 2,
                MeshcniError::Io(_) => 10,
                MeshcniError::Redirect(RedirectFailure::InvalidAnnotation { .. }) => 3,
                MeshcniError::Redirect(
                    RedirectFailure::InvocationFailed { .. } | RedirectFailure::ToolUnavailable(_),
                ) => 4,
                MeshcniError::Redirect(RedirectFailure::UnknownField(_)) => 1,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<RedirectError> for CliError {
    fn from(e: RedirectError) -> Self {
        if e.is_validation() {
            return Self::Annotation(e.to_string());
        }
        match e {
            RedirectError::Spawn { .. } | RedirectError::InvocationFailed { .. } => {
                Self::Redirect(e.to_string())
            }
            RedirectError::Config { .. } => Self::Config(e.to_string()),
            _ => Self::Command(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use meshcni_core::error::ConfigError;
    use meshcni_redirect::RedirectConfig;
    use meshcni_redirect::registry::{EXCLUDE_PORTS_KEY, INCLUDE_PORTS_KEY};

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_annotation_error() {
        let err = CliError::Annotation("bad mode".to_owned());
        assert_eq!(err.exit_code(), 3, "annotation error should return exit code 3");
    }

    #[test]
    fn test_exit_code_redirect_error() {
        let err = CliError::Redirect("exit status 1".to_owned());
        assert_eq!(err.exit_code(), 4, "redirect error should return exit code 4");
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(err.exit_code(), 1, "command error should return exit code 1");
    }

    #[test]
    fn test_exit_code_core_errors() {
        let err: CliError = MeshcniError::Config(ConfigError::FileNotFound {
            path: "meshcni.toml".to_owned(),
        })
        .into();
        assert_eq!(err.exit_code(), 2);

        let err: CliError = MeshcniError::Redirect(RedirectFailure::InvocationFailed {
            netns: "/var/run/netns/x".to_owned(),
            reason: "exit status 1".to_owned(),
        })
        .into();
        assert_eq!(err.exit_code(), 4);

        let err: CliError = MeshcniError::Redirect(RedirectFailure::InvalidAnnotation {
            field: "redirectMode".to_owned(),
            reason: "bad".to_owned(),
        })
        .into();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_from_redirect_error_maps_exit_codes() {
        let err: CliError = RedirectError::InvocationFailed {
            netns: "/var/run/netns/x".to_owned(),
            status: Some(1),
            output: "boom".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("boom"));

        let err: CliError = RedirectError::Spawn {
            program: "nsenter".to_owned(),
            reason: "not found".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 4);

        let err: CliError = RedirectError::Config {
            field: "redirect.redirect_mode".to_owned(),
            reason: "bad".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);

        let err: CliError = RedirectError::UnknownField("x".to_owned()).into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_from_redirect_validation_error_is_annotation() {
        let err = RedirectConfig::from_annotations(
            None,
            &["80".to_owned()],
            &HashMap::from([
                (INCLUDE_PORTS_KEY.to_owned(), "70000".to_owned()),
                (EXCLUDE_PORTS_KEY.to_owned(), "*".to_owned()),
            ]),
        )
        .unwrap_err();
        assert!(err.is_validation());

        let err: CliError = err.into();
        assert!(matches!(err, CliError::Annotation(_)));
        assert_eq!(err.exit_code(), 3);
        let msg = err.to_string();
        assert!(msg.contains("excludePorts"));
        assert!(msg.contains("70000"));
    }

    #[test]
    fn test_error_display_command() {
        let err = CliError::Command("execution failed".to_owned());
        assert_eq!(format!("{}", err), "execution failed");
    }

    #[test]
    fn test_error_display_config() {
        let err = CliError::Config("invalid TOML syntax".to_owned());
        let display_str = format!("{}", err);
        assert!(display_str.contains("configuration error"));
        assert!(display_str.contains("invalid TOML syntax"));
    }
}
