use anyhow::Context;
use imagestore_client::driver::{self, Invocation};
use imagestore_client::{ClientConfig, Error, SecureObjectClient};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // stdout carries the test output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let invocation = match Invocation::from_args(std::env::args_os().skip(1)) {
        Ok(invocation) => invocation,
        Err(Error::Usage(msg)) => {
            println!("{msg}");
            return ExitCode::from(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    match run(&invocation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(1)
        }
    }
}

fn run(invocation: &Invocation) -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    let client = SecureObjectClient::connect(&config)
        .with_context(|| format!("failed to connect to {}", config.address()))?;

    let stdout = io::stdout();
    driver::run(&client, invocation, &mut stdout.lock())
        .with_context(|| format!("failed to read and remove {}", invocation.key))?;
    Ok(())
}
