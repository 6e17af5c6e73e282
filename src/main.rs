mod cli;

use anyhow::Context;
use clap::Parser;
use semdb::config::Backend;
use semdb::{server, Config};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, TopCommand};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())
        .context("loading config")?
        .with_env()
        .context("applying environment overrides")?;
    cli.apply(&mut config);

    init_tracing(&config.log);

    let service = config.build_service().context("opening vector store")?;

    match cli.command {
        None => cli::run_repl(&service)?,
        Some(TopCommand::Serve { host, port }) => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            server::run(service, &host, port)
                .await
                .with_context(|| format!("serving on {host}:{port}"))?;
        }
        Some(TopCommand::Op(command)) => {
            if config.store.backend == Backend::Memory {
                warn!("using the in-memory store; changes are discarded on exit (pass --db)");
            }
            cli::execute(&service, command)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured filter. Logs go to stderr.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
