use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::hosts;
use crate::script::loader::{adhoc, load_dir};
use crate::script::ScriptFile;
use crate::transport::HostKeyPolicy;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

pub const DEFAULT_PORT: u16 = 22;

/// Environment variable read instead of prompting for the password.
pub const PASSWORD_ENV: &str = "SSHSCRIPT_PASSWORD";

/// Defaults read from a YAML file; command line flags take precedence.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub user: Option<String>,
    pub hosts: Option<String>,
    pub port: Option<u16>,
    pub known_hosts: Option<HostKeyPolicy>,
    #[serde(default)]
    pub parallel: bool,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("reading config file: {}", path.display());
        let f = std::fs::File::open(path).map_err(|source| Error::Load {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_reader(f)
            .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))
    }
}

/// Where the scripts for a run come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptSource {
    Directory(PathBuf),
    Command { command: String, pw: bool },
}

/// Settings for one run, fixed at start-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub user: String,
    pub hosts: Vec<String>,
    pub source: ScriptSource,
    pub no_password: bool,
    pub port: u16,
    pub known_hosts: HostKeyPolicy,
    pub parallel: bool,
    pub list_hosts: bool,
}

impl Config {
    /// Builds the run configuration from the command line, reading the
    /// config file it names and falling back to `$USER`.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Config::resolve(cli, file, std::env::var("USER").ok())
    }

    /// Merges flags over file settings over the environment's user name,
    /// then validates the result.
    pub fn resolve(cli: Cli, file: FileConfig, env_user: Option<String>) -> Result<Self> {
        let hosts = cli
            .hosts
            .or(file.hosts)
            .filter(|hosts| !hosts.trim().is_empty())
            .ok_or_else(|| Error::Config("--hosts is required".to_string()))?;

        let user = cli
            .user
            .or(file.user)
            .or(env_user)
            .filter(|user| !user.is_empty())
            .ok_or_else(|| Error::Config("--user or $USER must be set".to_string()))?;

        let source = match (cli.scripts, cli.command) {
            (None, None) => {
                return Err(Error::Config(
                    "--scripts or --command is required".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(Error::Config(
                    "only one of --scripts or --command allowed".to_string(),
                ))
            }
            (Some(_), None) if cli.pw => {
                return Err(Error::Config(
                    "--pw only allowed in conjunction with --command".to_string(),
                ))
            }
            (Some(dir), None) => ScriptSource::Directory(dir),
            (None, Some(command)) => ScriptSource::Command {
                command,
                pw: cli.pw,
            },
        };

        if cli.no_password && cli.pw {
            return Err(Error::Config(
                "--pw cannot be combined with --no-password".to_string(),
            ));
        }

        Ok(Config {
            user,
            hosts: hosts::expand(&hosts)?,
            source,
            no_password: cli.no_password,
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            known_hosts: cli.known_hosts.or(file.known_hosts).unwrap_or_default(),
            parallel: cli.parallel || file.parallel,
            list_hosts: cli.list_hosts,
        })
    }

    /// Loads and parses the scripts this run executes.
    pub fn load_scripts(&self) -> Result<Vec<ScriptFile>> {
        let files = match &self.source {
            ScriptSource::Directory(dir) => load_dir(dir)?,
            ScriptSource::Command { command, pw } => vec![adhoc(command, *pw)?],
        };
        self.check_password(&files)?;
        Ok(files)
    }

    /// Rejects `--no-password` when a script needs the password.
    pub fn check_password(&self, files: &[ScriptFile]) -> Result<()> {
        if !self.no_password {
            return Ok(());
        }
        match files
            .iter()
            .find(|file| file.requires_password() || file.uses_placeholder())
        {
            Some(file) => Err(Error::PasswordRequired {
                name: file.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Reads the password from the environment or the terminal. Returns
    /// `None` with `--no-password`.
    pub fn read_password(&self) -> Result<Option<Zeroizing<String>>> {
        if self.no_password {
            return Ok(None);
        }
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            debug!("using password from {}", PASSWORD_ENV);
            return Ok(Some(Zeroizing::new(password)));
        }
        let prompt = format!("password for {}: ", self.user);
        rpassword::prompt_password(prompt)
            .map(|password| Some(Zeroizing::new(password)))
            .map_err(|e| Error::Config(format!("failed to read password: {}", e)))
    }
}
