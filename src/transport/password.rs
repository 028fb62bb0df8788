use crate::transport::{
    AuthRejected, CommandOutput, Connection, Exit, HostKeyPolicy, PtyRequest, Session, Transport,
};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect, Pty};
use russh_keys::key;
use std::sync::Arc;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

/// Connects with russh and authenticates with the user's password.
pub struct PasswordTransport {
    port: u16,
    policy: HostKeyPolicy,
}

impl PasswordTransport {
    pub fn new(port: u16, policy: HostKeyPolicy) -> Self {
        PasswordTransport { port, policy }
    }
}

struct ClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = anyhow::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.policy {
            HostKeyPolicy::Accept => Ok(true),
            HostKeyPolicy::Strict => {
                let known = russh_keys::check_known_hosts(&self.host, self.port, server_public_key)
                    .with_context(|| format!("host key check failed for {}", self.host))?;
                if !known {
                    warn!("{} is not in known_hosts", self.host);
                }
                Ok(known)
            }
            HostKeyPolicy::Add => {
                let known = russh_keys::check_known_hosts(&self.host, self.port, server_public_key)
                    .with_context(|| format!("host key check failed for {}", self.host))?;
                if !known {
                    warn!("adding {} to known_hosts", self.host);
                    russh_keys::learn_known_hosts(&self.host, self.port, server_public_key)?;
                }
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl Transport for PasswordTransport {
    async fn connect(
        &self,
        host: &str,
        user: &str,
        password: Option<&str>,
    ) -> Result<Box<dyn Connection>> {
        let password = password.context("password authentication needs a password")?;

        let config = Arc::new(client::Config::default());
        let handler = ClientHandler {
            host: host.to_string(),
            port: self.port,
            policy: self.policy,
        };

        debug!("connecting to {}:{} as {}", host, self.port, user);
        let mut handle = client::connect(config, (host, self.port), handler)
            .await
            .with_context(|| format!("failed to connect to {}:{}", host, self.port))?;

        let authenticated = handle.authenticate_password(user, password).await?;
        if !authenticated {
            return Err(AuthRejected {
                host: host.to_string(),
                user: user.to_string(),
            }
            .into());
        }

        Ok(Box::new(PasswordConnection {
            host: host.to_string(),
            handle: Mutex::new(handle),
        }))
    }
}

struct PasswordConnection {
    host: String,
    handle: Mutex<Handle<ClientHandler>>,
}

#[async_trait]
impl Connection for PasswordConnection {
    async fn open_session(&self) -> Result<Box<dyn Session>> {
        let channel = self.handle.lock().await.channel_open_session().await?;
        Ok(Box::new(PasswordSession {
            channel,
            input: Zeroizing::new(Vec::new()),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        debug!("disconnecting from {}", self.host);
        self.handle
            .get_mut()
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;
        Ok(())
    }
}

struct PasswordSession {
    channel: Channel<Msg>,
    input: Zeroizing<Vec<u8>>,
}

#[async_trait]
impl Session for PasswordSession {
    async fn request_pty(&mut self, pty: &PtyRequest) -> Result<()> {
        let modes = [
            (Pty::ECHO, u32::from(pty.echo)),
            (Pty::TTY_OP_ISPEED, pty.speed),
            (Pty::TTY_OP_OSPEED, pty.speed),
        ];
        self.channel
            .request_pty(false, &pty.term, pty.width, pty.height, 0, 0, &modes)
            .await
            .context("request pty failed")?;
        Ok(())
    }

    fn set_input(&mut self, input: &[u8]) {
        self.input = Zeroizing::new(input.to_vec());
    }

    async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        self.channel.exec(true, command).await?;
        if !self.input.is_empty() {
            self.channel.data(&self.input[..]).await?;
        }
        self.channel.eof().await?;

        let mut output = Vec::new();
        let mut exit = Exit::Unknown;
        while let Some(msg) = self.channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, .. } => output.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status } => exit = Exit::Status(exit_status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    exit = Exit::Signal(format!("{:?}", signal_name))
                }
                ChannelMsg::Failure => bail!("remote host refused to run `{}`", command),
                _ => {}
            }
        }

        Ok(CommandOutput::new(output, exit))
    }
}
