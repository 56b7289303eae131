use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeployError>;

/// Everything that can stop a deployment run. Nothing here is retried: every
/// variant ends the program with a non-zero exit code.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("required environment variable {0} is missing or empty")]
    MissingCredential(&'static str),

    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse settings file {}: {source}", .path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("could not parse template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not run '{command}' ({reason}); check that it is installed and on the PATH")]
    CommandNotFound { command: String, reason: String },

    #[error("command returned non-zero code ({code}): {command}\n{stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("unexpected output from '{command}': {details}")]
    UnexpectedOutput { command: String, details: String },

    #[error("deployment '{name}' ended in state {state}: {details}")]
    DeploymentFailed {
        name: String,
        state: String,
        details: String,
    },

    #[error("'{0}' is not a valid DNS label")]
    InvalidDnsLabel(String),
}

impl DeployError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeployError::Io {
            path: path.into(),
            source,
        }
    }
}
