pub mod password;
pub mod system;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// Opens connections to remote hosts.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connects to `host` as `user`. Transports that authenticate with a
    /// password fail when `password` is `None`.
    async fn connect(
        &self,
        host: &str,
        user: &str,
        password: Option<&str>,
    ) -> Result<Box<dyn Connection>>;
}

/// An established connection on which command sessions are opened.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Opens a fresh execution session. Sessions are never reused.
    async fn open_session(&self) -> Result<Box<dyn Session>>;

    /// Closes the connection.
    async fn close(&mut self) -> Result<()>;
}

/// A single remote command execution.
#[async_trait]
pub trait Session: Send {
    /// Requests a pseudo-terminal for the command.
    async fn request_pty(&mut self, pty: &PtyRequest) -> Result<()>;

    /// Sets the bytes fed to the command's stdin.
    fn set_input(&mut self, input: &[u8]);

    /// Runs `command`, collecting stdout and stderr into one buffer.
    ///
    /// A command exiting with a failure is not an error here; it is reported
    /// through [`CommandOutput::exit`].
    async fn run(&mut self, command: &str) -> Result<CommandOutput>;
}

/// Returned by a [`Transport`] when the host refuses the user's credentials.
#[derive(Debug, thiserror::Error)]
#[error("authentication rejected for {user}@{host}")]
pub struct AuthRejected {
    pub host: String,
    pub user: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PtyRequest {
    pub term: String,
    pub width: u32,
    pub height: u32,
    pub echo: bool,
    pub speed: u32,
}

impl Default for PtyRequest {
    fn default() -> Self {
        PtyRequest {
            term: "xterm".to_string(),
            width: 80,
            height: 40,
            echo: false,
            speed: 14400,
        }
    }
}

/// How a remote command ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    Status(u32),
    Signal(String),
    /// The channel closed without an exit status.
    Unknown,
}

impl Exit {
    pub fn success(&self) -> bool {
        matches!(self, Exit::Status(0))
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::Status(code) => write!(f, "exited with status {}", code),
            Exit::Signal(signal) => write!(f, "was killed by signal {}", signal),
            Exit::Unknown => write!(f, "exited without reporting a status"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: Vec<u8>,
    pub exit: Exit,
}

impl CommandOutput {
    pub fn new(output: Vec<u8>, exit: Exit) -> Self {
        CommandOutput { output, exit }
    }
}

/// What to do with a server's host key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HostKeyPolicy {
    /// Only hosts already in known_hosts are accepted.
    Strict,
    /// Unknown hosts are added to known_hosts; changed keys are rejected.
    #[default]
    Add,
    /// Any key is accepted.
    Accept,
}

impl From<HostKeyPolicy> for openssh::KnownHosts {
    fn from(policy: HostKeyPolicy) -> Self {
        match policy {
            HostKeyPolicy::Strict => openssh::KnownHosts::Strict,
            HostKeyPolicy::Add => openssh::KnownHosts::Add,
            HostKeyPolicy::Accept => openssh::KnownHosts::Accept,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_success() {
        assert!(Exit::Status(0).success());
        assert!(!Exit::Status(1).success());
        assert!(!Exit::Signal("KILL".to_string()).success());
        assert!(!Exit::Unknown.success());
    }

    #[test]
    fn test_exit_display() {
        assert_eq!(Exit::Status(2).to_string(), "exited with status 2");
        assert_eq!(
            Exit::Signal("TERM".to_string()).to_string(),
            "was killed by signal TERM"
        );
    }

    #[test]
    fn test_default_pty_disables_echo() {
        let pty = PtyRequest::default();

        assert!(!pty.echo);
        assert_eq!((pty.width, pty.height), (80, 40));
    }

    #[test]
    fn test_host_key_policy_from_yaml() {
        let policy: HostKeyPolicy = serde_yaml::from_str("strict").unwrap();

        assert_eq!(policy, HostKeyPolicy::Strict);
    }
}
