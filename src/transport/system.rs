use crate::transport::{CommandOutput, Connection, Exit, HostKeyPolicy, PtyRequest, Session, Transport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use openssh::{SessionBuilder, Stdio};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use zeroize::Zeroizing;

/// Connects through the system `ssh` binary, authenticating with the user's
/// agent or keys.
pub struct SystemTransport {
    port: u16,
    policy: HostKeyPolicy,
}

impl SystemTransport {
    pub fn new(port: u16, policy: HostKeyPolicy) -> Self {
        SystemTransport { port, policy }
    }
}

#[async_trait]
impl Transport for SystemTransport {
    async fn connect(
        &self,
        host: &str,
        user: &str,
        _password: Option<&str>,
    ) -> Result<Box<dyn Connection>> {
        debug!("connecting to {}@{}:{} with ssh", user, host, self.port);

        let mut builder = SessionBuilder::default();
        builder
            .user(user.to_string())
            .port(self.port)
            .known_hosts_check(self.policy.into());
        let session = builder
            .connect_mux(host)
            .await
            .with_context(|| format!("failed to connect to {}", host))?;

        Ok(Box::new(SystemConnection {
            session: Some(Arc::new(session)),
        }))
    }
}

struct SystemConnection {
    session: Option<Arc<openssh::Session>>,
}

#[async_trait]
impl Connection for SystemConnection {
    async fn open_session(&self) -> Result<Box<dyn Session>> {
        let session = self.session.clone().context("connection already closed")?;
        Ok(Box::new(SystemSession {
            session,
            input: Zeroizing::new(Vec::new()),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            match Arc::try_unwrap(session) {
                Ok(session) => session.close().await?,
                Err(_) => debug!("session still in use, leaving it to be dropped"),
            }
        }
        Ok(())
    }
}

struct SystemSession {
    session: Arc<openssh::Session>,
    input: Zeroizing<Vec<u8>>,
}

#[async_trait]
impl Session for SystemSession {
    async fn request_pty(&mut self, pty: &PtyRequest) -> Result<()> {
        debug!("system ssh transport runs without a {} terminal", pty.term);
        Ok(())
    }

    fn set_input(&mut self, input: &[u8]) {
        self.input = Zeroizing::new(input.to_vec());
    }

    async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        let mut cmd = self.session.command("sh");
        cmd.arg("-c")
            .arg(format!("exec 2>&1\n{}", command))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().await?;
        if let Some(mut stdin) = child.stdin().take() {
            stdin.write_all(&self.input).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        let exit = match output.status.code() {
            Some(code) => Exit::Status(code as u32),
            None => Exit::Unknown,
        };

        Ok(CommandOutput::new(output.stdout, exit))
    }
}
