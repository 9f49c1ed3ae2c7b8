use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use protocol::AckResult;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Debug, Clone)]
struct SimConfig {
    addr: String,
    secret: String,
    topic: Option<String>,
    message: Option<String>,
    raw: Option<String>,
    repeat: u32,
    timeout_ms: u64,
}

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = parse_args()?;

    println!("[sim-client] connecting to tcp://{}", cfg.addr);
    let stream = TcpStream::connect(cfg.addr.as_str())
        .await
        .with_context(|| format!("failed to connect to {}", cfg.addr))?;
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let line = request_line(&cfg)?;
    let mut rejected = 0u32;

    for attempt in 1..=cfg.repeat {
        println!("[sim-client] #{} -> {}", attempt, line.trim_end());
        write_half
            .write_all(line.as_bytes())
            .await
            .context("failed to send request")?;

        let reply = timeout(Duration::from_millis(cfg.timeout_ms), lines.next_line())
            .await
            .map_err(|_| anyhow!("no acknowledgment within {} ms", cfg.timeout_ms))?
            .context("failed to read acknowledgment")?
            .ok_or_else(|| anyhow!("connection closed before acknowledgment"))?;

        let ack: AckResult = serde_json::from_str(&reply)
            .with_context(|| format!("unexpected acknowledgment: {}", reply))?;
        println!("[sim-client] #{} <- {}", attempt, reply);

        if !ack.success {
            rejected += 1;
        }
    }

    if rejected > 0 {
        bail!("{} of {} requests were rejected", rejected, cfg.repeat);
    }

    println!("[sim-client] all {} requests accepted", cfg.repeat);
    Ok(())
}

fn request_line(cfg: &SimConfig) -> anyhow::Result<String> {
    let mut line = match &cfg.raw {
        Some(raw) => raw.clone(),
        None => serde_json::to_string(&BridgeRequest {
            secret: &cfg.secret,
            topic: cfg.topic.as_deref(),
            message: cfg.message.as_deref(),
        })?,
    };
    line.push('\n');
    Ok(line)
}

fn parse_args() -> anyhow::Result<SimConfig> {
    let mut cfg = SimConfig {
        addr: "127.0.0.1:1445".to_string(),
        secret: "youshouldchangethis".to_string(),
        topic: None,
        message: None,
        raw: None,
        repeat: 1,
        timeout_ms: 5_000,
    };

    let mut args = std::env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--addr" => cfg.addr = next_arg_value(&mut args, &arg)?,
            "--secret" => cfg.secret = next_arg_value(&mut args, &arg)?,
            "--topic" => cfg.topic = Some(next_arg_value(&mut args, &arg)?),
            "--message" => cfg.message = Some(next_arg_value(&mut args, &arg)?),
            "--raw" => cfg.raw = Some(next_arg_value(&mut args, &arg)?),
            "--repeat" => {
                let value = next_arg_value(&mut args, &arg)?;
                cfg.repeat = value
                    .parse::<u32>()
                    .with_context(|| format!("invalid --repeat: {}", value))?;
            }
            "--timeout-ms" => {
                let value = next_arg_value(&mut args, &arg)?;
                cfg.timeout_ms = value
                    .parse::<u64>()
                    .with_context(|| format!("invalid --timeout-ms: {}", value))?;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                bail!("unknown argument: {}\nUse --help to list options.", other);
            }
        }
    }

    if cfg.repeat == 0 {
        bail!("--repeat must be at least 1");
    }

    Ok(cfg)
}

fn next_arg_value<I>(args: &mut std::iter::Peekable<I>, flag: &str) -> anyhow::Result<String>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| anyhow!("missing value for {}", flag))
}

fn print_help() {
    println!(
        "sim-client - sends requests to the socket bridge and prints the acknowledgments\n\n\
Usage:\n\
  cargo run -p bridge --bin sim-client -- [options]\n\n\
Options:\n\
  --addr <host:port>     Bridge address (default: 127.0.0.1:1445)\n\
  --secret <secret>      Shared secret (default: youshouldchangethis)\n\
  --topic <topic>        Topic to publish to (omitted when not given)\n\
  --message <text>       Message payload (omitted when not given)\n\
  --raw <line>           Send this line verbatim instead of building a request\n\
  --repeat <n>           Send the request n times on one connection (default: 1)\n\
  --timeout-ms <ms>      Wait for each acknowledgment at most this long (default: 5000)\n\
  --help                 Show this help\n"
    );
}
