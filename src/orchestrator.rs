use crate::error::{Error, Result};
use crate::report::{Reporter, Transcript, NO_OUTPUT};
use crate::script::substitute::stdin_payload;
use crate::script::{Script, ScriptFile};
use crate::transport::{AuthRejected, Connection, PtyRequest, Transport};
use log::{debug, info, warn};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Runs parsed script files against hosts over a [`Transport`].
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    user: String,
    password: Option<Zeroizing<String>>,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        user: &str,
        password: Option<Zeroizing<String>>,
    ) -> Self {
        Orchestrator {
            transport,
            user: user.to_string(),
            password,
        }
    }

    /// Visits hosts one at a time, stopping at the first failure.
    pub async fn run(
        &self,
        hosts: &[String],
        files: &[ScriptFile],
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        for host in hosts {
            self.run_host(host, files, reporter).await?;
        }
        Ok(())
    }

    /// Runs every host concurrently, one task per host. Each host's
    /// transcript is buffered and emitted whole, in host order.
    ///
    /// Returns the first error in host order; other hosts run to completion.
    pub async fn run_parallel(
        self: Arc<Self>,
        hosts: &[String],
        files: Arc<Vec<ScriptFile>>,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        let handles: Vec<_> = hosts
            .iter()
            .map(|host| {
                let orchestrator = Arc::clone(&self);
                let files = Arc::clone(&files);
                let task_host = host.clone();
                let handle = tokio::spawn(async move {
                    let mut transcript = Transcript::new();
                    let result = orchestrator
                        .run_host(&task_host, &files, &mut transcript)
                        .await;
                    (transcript, result)
                });
                (host.clone(), handle)
            })
            .collect();

        let mut first_error = None;
        for (host, handle) in handles {
            let result = match handle.await {
                Ok((transcript, result)) => {
                    transcript.replay(reporter);
                    result
                }
                Err(e) => Err(Error::Transport {
                    host: host.clone(),
                    file: "host task".to_string(),
                    source: e.into(),
                }),
            };

            if let Err(e) = result {
                warn!("{} failed: {}", host, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Connects to `host` once and runs every script file over that
    /// connection.
    pub async fn run_host(
        &self,
        host: &str,
        files: &[ScriptFile],
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        info!("executing on host: {}", host);

        let mut connection = self
            .transport
            .connect(host, &self.user, self.password.as_ref().map(|p| p.as_str()))
            .await
            .map_err(|source| match source.downcast::<AuthRejected>() {
                Ok(rejected) => Error::Auth {
                    host: rejected.host,
                    user: rejected.user,
                },
                Err(source) => Error::Connect {
                    host: host.to_string(),
                    source,
                },
            })?;

        reporter.banner(host);
        let result = self.run_files(connection.as_ref(), host, files, reporter).await;

        if let Err(e) = connection.close().await {
            debug!("failed to close connection to {}: {}", host, e);
        }

        result
    }

    async fn run_files(
        &self,
        connection: &dyn Connection,
        host: &str,
        files: &[ScriptFile],
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        for file in files {
            self.run_scriptfile(connection, host, file, reporter).await?;
            reporter.blank();
        }
        Ok(())
    }

    /// Runs the scripts of one file in order, stopping at the first failure.
    pub async fn run_scriptfile(
        &self,
        connection: &dyn Connection,
        host: &str,
        file: &ScriptFile,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        debug!("running {} on {}", file, host);
        for script in &file.scripts {
            self.run_script(connection, host, file, script, reporter).await?;
        }
        Ok(())
    }

    /// Runs one script in a fresh session and reports its output.
    pub async fn run_script(
        &self,
        connection: &dyn Connection,
        host: &str,
        file: &ScriptFile,
        script: &Script,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        reporter.info(&format!("executing command `{}`", script.command));

        let session_error = |source| Error::Session {
            host: host.to_string(),
            source,
        };
        let mut session = connection.open_session().await.map_err(session_error)?;

        let password = self.password.as_ref().map(|p| p.as_str()).unwrap_or("");
        let payload = stdin_payload(&script.stdin, password)?;
        session.set_input(payload.as_bytes());
        session
            .request_pty(&PtyRequest::default())
            .await
            .map_err(session_error)?;

        let output = session
            .run(&script.command)
            .await
            .map_err(|source| Error::Transport {
                host: host.to_string(),
                file: file.name.clone(),
                source,
            })?;

        let text = String::from_utf8_lossy(&output.output);
        let text = text.trim();
        if text.is_empty() {
            reporter.emphasis(NO_OUTPUT);
        } else {
            reporter.output(text);
        }

        if !output.exit.success() {
            return Err(Error::Command {
                host: host.to_string(),
                file: file.name.clone(),
                command: script.command.clone(),
                reason: output.exit.to_string(),
            });
        }

        Ok(())
    }
}
