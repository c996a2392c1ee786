//! A small interactive driver for [`sojourn_broker`], for manual
//! exploration of matching and AQM behavior from a terminal.
//!
//! Reads a `BrokerConfig` from a TOML file, starts a broker on it, then
//! reads commands from stdin:
//!
//! ```text
//! ask            submit a synchronous ask(), block for its outcome
//! ask_r          submit a synchronous ask_r(), block for its outcome
//! async_ask      submit an asynchronous ask(), print its handle immediately
//! async_ask_r    submit an asynchronous ask_r(), print its handle immediately
//! cancel <n>     cancel the pending request with correlation handle n
//! quit           exit
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use sojourn_broker::{BrokerConfig, BrokerHandle, CorrelationHandle, SystemClock};

/// Drive a sojourn broker from the terminal.
#[derive(Debug, Parser)]
struct Args {
    /// Path to a TOML file deserializing to a `BrokerConfig`.
    #[arg(long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let raw = std::fs::read_to_string(&args.config)?;
    let config: BrokerConfig = toml::from_str(&raw)?;

    let broker = BrokerHandle::spawn(config, Arc::new(SystemClock::new()))?;
    println!("broker started from {}", args.config.display());

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut words = line.split_whitespace();
        match words.next() {
            Some("ask") => {
                let outcome = broker.ask().await?;
                println!("{outcome:?}");
            },
            Some("ask_r") => {
                let outcome = broker.ask_r().await?;
                println!("{outcome:?}");
            },
            Some("async_ask") => {
                let (handle, receiver) = broker.async_ask()?;
                println!("handle {handle}");
                tokio::spawn(await_and_print(receiver));
            },
            Some("async_ask_r") => {
                let (handle, receiver) = broker.async_ask_r()?;
                println!("handle {handle}");
                tokio::spawn(await_and_print(receiver));
            },
            Some("cancel") => match words.next().and_then(|n| n.parse::<u64>().ok()) {
                Some(n) => {
                    broker.cancel(CorrelationHandle::from_raw(n));
                    println!("cancelled {n}");
                },
                None => println!("usage: cancel <handle>"),
            },
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unrecognized command: {other}"),
            None => {},
        }
    }

    Ok(())
}

async fn await_and_print(receiver: tokio::sync::oneshot::Receiver<sojourn_broker::Outcome>) {
    match receiver.await {
        Ok(outcome) => println!("{outcome:?}"),
        Err(_) => println!("broker closed before a terminal outcome arrived"),
    }
}

fn readline() -> anyhow::Result<String> {
    let mut buffer = String::new();
    std::io::stdin().read_line(&mut buffer)?;
    if buffer.ends_with('\n') {
        buffer.pop();
        if buffer.ends_with('\r') {
            buffer.pop();
        }
    }
    Ok(buffer)
}
