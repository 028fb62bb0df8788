use crate::transport::HostKeyPolicy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// ssh username, defaults to $USER
    #[arg(short, long)]
    pub user: Option<String>,

    /// the list of hosts, e.g. 'web[1:3].example.com,db01'
    #[arg(long, value_name = "HOSTS")]
    pub hosts: Option<String>,

    /// the directory full of scripts
    #[arg(short, long, value_name = "DIR")]
    pub scripts: Option<PathBuf>,

    /// the command to run
    #[arg(short, long)]
    pub command: Option<String>,

    /// send password on stdin after running --command
    #[arg(long, action)]
    pub pw: bool,

    /// skip the password prompt and authenticate with ssh agent or keys
    #[arg(long, action)]
    pub no_password: bool,

    /// verbose mode
    #[arg(short, long, action)]
    pub verbose: bool,

    /// YAML file with default settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// ssh port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// how to treat host keys missing from known_hosts
    #[arg(long, value_enum)]
    pub known_hosts: Option<HostKeyPolicy>,

    /// run hosts concurrently
    #[arg(long, action)]
    pub parallel: bool,

    /// outputs the expanded list of hosts; does not execute anything else
    #[arg(long, action)]
    pub list_hosts: bool,
}
