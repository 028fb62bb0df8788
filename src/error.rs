use std::path::PathBuf;

/// Errors surfaced by parsing, loading and running script files.
///
/// Every variant carries the file name or host it concerns, so the top level
/// can print it without further wrapping.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no command in script {name}")]
    Parse { name: String },

    #[error("failed to read script file {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no scripts found in {path}")]
    NoScripts { path: PathBuf },

    #[error("failed to dial host {host}")]
    Connect {
        host: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("authentication rejected for {user}@{host}")]
    Auth { host: String, user: String },

    #[error("failed to open session on {host}")]
    Session {
        host: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to run {file} on {host}: command `{command}` {reason}")]
    Command {
        host: String,
        file: String,
        command: String,
        reason: String,
    },

    #[error("failed to run {file} on {host}")]
    Transport {
        host: String,
        file: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("script {name} needs a password but --no-password was given")]
    PasswordRequired { name: String },

    #[error("invalid host expression: {0}")]
    HostPattern(String),

    #[error("{0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
