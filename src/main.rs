use anyhow::Result;
use clap::Parser;
use log::info;
use sshscript::cli::Cli;
use sshscript::config::Config;
use sshscript::orchestrator::Orchestrator;
use sshscript::report::ConsoleReporter;
use sshscript::transport::password::PasswordTransport;
use sshscript::transport::system::SystemTransport;
use sshscript::transport::Transport;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, default_filter),
    );

    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_cli(cli)?;

    if config.list_hosts {
        for host in &config.hosts {
            println!("{}", host);
        }
        return Ok(());
    }

    let files = config.load_scripts()?;
    info!(
        "loaded {} script file(s) for {} host(s)",
        files.len(),
        config.hosts.len()
    );

    let password = config.read_password()?;
    let transport: Arc<dyn Transport> = if config.no_password {
        Arc::new(SystemTransport::new(config.port, config.known_hosts))
    } else {
        Arc::new(PasswordTransport::new(config.port, config.known_hosts))
    };

    let orchestrator = Arc::new(Orchestrator::new(transport, &config.user, password));
    let mut reporter = ConsoleReporter;

    if config.parallel {
        orchestrator
            .run_parallel(&config.hosts, Arc::new(files), &mut reporter)
            .await?;
    } else {
        orchestrator
            .run(&config.hosts, &files, &mut reporter)
            .await?;
    }

    Ok(())
}
