//! Radioddity GM-30 programming CLI
//! Reads and writes the radio's configuration over a serial cable

use anyhow::{anyhow, bail, Context};
use gm30_rs::serial::{detect_programming_cable, SerialConfig, SerialPort};
use gm30_rs::{HandshakeOptions, Protocol, RadioConfig};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

/// Full device memory span reachable over the protocol.
const RAW_MEMORY_BASE: u16 = 0x1000;
const RAW_MEMORY_SIZE: usize = 0xF000;

/// Per-segment raw write length, leaving the marker byte untouched.
const RAW_WRITE_SIZE: usize = 0xFFE;

struct CliArgs {
    command: String,
    device: Option<String>,
    file: Option<PathBuf>,
    force: bool,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <command> [options]\n\
         \n\
         Commands:\n\
         \x20 read   -c <file>   read config from radio\n\
         \x20 write  -c <file>   write config to radio (requires --force)\n\
         \x20 mr     -f <file>   read raw radio memory\n\
         \x20 mw     -f <file>   write raw radio memory (requires --force)\n\
         \n\
         Options:\n\
         \x20 -d <device>   serial device (default: auto-detect cable)\n\
         \x20 --force       confirm a write to the radio\n"
    )
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut command = None;
    let mut device = None;
    let mut file = None;
    let mut force = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-d" | "--device" => {
                device = Some(
                    iter.next()
                        .ok_or_else(|| anyhow!("missing value for {}", arg))?
                        .clone(),
                );
            }
            "-c" | "--config-file" | "-f" | "--data-file" => {
                file = Some(PathBuf::from(
                    iter.next()
                        .ok_or_else(|| anyhow!("missing value for {}", arg))?,
                ));
            }
            "--force" => force = true,
            other if command.is_none() && !other.starts_with('-') => {
                command = Some(other.to_string());
            }
            other => bail!("unexpected argument: {}", other),
        }
    }

    Ok(CliArgs {
        command: command.ok_or_else(|| anyhow!("no command given"))?,
        device,
        file,
        force,
    })
}

fn open_protocol(device: &str) -> anyhow::Result<Protocol<SerialPort>> {
    tracing::info!("Using serial device: {}", device);
    let port = SerialPort::open(device, SerialConfig::default())
        .with_context(|| format!("failed to open {}", device))?;
    Ok(Protocol::new(port))
}

async fn read_config(device: &str, file: &PathBuf) -> anyhow::Result<()> {
    let mut protocol = open_protocol(device)?;

    let mut config = RadioConfig::new();
    config.read_radio(&mut protocol).await?;
    protocol.into_inner().close()?;

    println!("{}", config.hexdump()?);
    fs::write(file, config.save_image()?)?;
    tracing::info!("Saved config to {}", file.display());
    Ok(())
}

async fn write_config(device: &str, file: &PathBuf, force: bool) -> anyhow::Result<()> {
    let data = fs::read(file)?;
    let mut config = RadioConfig::new();
    config.load_image(&data)?;

    println!("{}", config.hexdump()?);

    if !force {
        bail!("refusing to write to the radio without --force");
    }

    let mut protocol = open_protocol(device)?;
    config.write_radio(&mut protocol).await?;
    protocol.into_inner().close()?;

    tracing::info!("Wrote config from {}", file.display());
    Ok(())
}

async fn read_raw_memory(device: &str, file: &PathBuf) -> anyhow::Result<()> {
    let mut protocol = open_protocol(device)?;
    protocol
        .enter_programming_mode(&HandshakeOptions::default())
        .await?;

    tracing::info!("Reading {:#06x} bytes of raw memory", RAW_MEMORY_SIZE);
    let data = protocol
        .read_memory_range(RAW_MEMORY_BASE, RAW_MEMORY_SIZE, gm30_rs::serial::DEFAULT_CHUNK_SIZE)
        .await?;
    protocol.into_inner().close()?;

    fs::write(file, data)?;
    tracing::info!("Saved raw memory to {}", file.display());
    Ok(())
}

async fn write_raw_memory(device: &str, file: &PathBuf, force: bool) -> anyhow::Result<()> {
    let data = fs::read(file)?;
    if data.len() != RAW_MEMORY_SIZE {
        bail!("invalid data file size: {:#06x} bytes", data.len());
    }

    if !force {
        bail!("refusing to write to the radio without --force");
    }

    let mut protocol = open_protocol(device)?;
    protocol
        .enter_programming_mode(&HandshakeOptions::default())
        .await?;

    // write the data portion of each segment, never the marker byte
    for segment in 0..gm30_rs::SEGMENT_COUNT {
        let offset = segment * gm30_rs::SEGMENT_SIZE;
        let address = ((segment + 1) * gm30_rs::SEGMENT_SIZE) as u16;
        protocol
            .write_memory_range(
                address,
                &data[offset..offset + RAW_WRITE_SIZE],
                gm30_rs::serial::DEFAULT_CHUNK_SIZE,
            )
            .await?;
    }
    protocol.into_inner().close()?;

    tracing::info!("Wrote raw memory from {}", file.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .init();

    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args[1..]) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", usage(&args[0]));
            return Err(e);
        }
    };

    let device = match cli.device.clone() {
        Some(device) => device,
        None => detect_programming_cable()?
            .ok_or_else(|| anyhow!("failed to automatically detect a programming cable"))?,
    };

    let file = cli
        .file
        .clone()
        .ok_or_else(|| anyhow!("no file given; see usage"))?;

    match cli.command.as_str() {
        "read" => read_config(&device, &file).await,
        "write" => write_config(&device, &file, cli.force).await,
        "mr" => read_raw_memory(&device, &file).await,
        "mw" => write_raw_memory(&device, &file, cli.force).await,
        other => {
            eprintln!("{}", usage(&args[0]));
            bail!("unknown command: {}", other)
        }
    }
}
