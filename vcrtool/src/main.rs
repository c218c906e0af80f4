// vcrtool -- command-line control of JVC VCRs over JLIP.
//
// Usage:
//   vcrtool --port /dev/ttyUSB0 status
//   vcrtool --port /dev/ttyUSB0 run stop rewind get-vtr-mode
//   vcrtool --port /dev/ttyUSB0 --id 2 rewind-wait --timeout 300
//   vcrtool --port /dev/ttyUSB0 eject-wait
//   vcrtool --port /dev/ttyUSB0 set-id 3
//   vcrtool --port /dev/ttyUSB0 channel 12
//   vcrtool --port /dev/ttyUSB0 probe --claimed-prefix /dev/jlip
//   vcrtool list
//
// The port and JLIP id can also come from VCRTOOL_PORT and VCRTOOL_JLIP_ID.

mod logging;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use jlip_core::Transport;
use jlip_vcr::probe::{JLIP_ID_RANGE, find_unclaimed};
use jlip_vcr::{JlipLink, JlipVcr, VcrBuilder, VcrCommand, WaitPolicy};

use crate::logging::{LogFormat, LogLevel, init_logging};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Control a JVC VCR over its JLIP serial port.
#[derive(Parser, Debug)]
#[command(name = "vcrtool", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required for every command except `list`.
    #[arg(long, env = "VCRTOOL_PORT", global = true)]
    port: Option<String>,

    /// JLIP id of the target deck (1-99).
    #[arg(
        long,
        env = "VCRTOOL_JLIP_ID",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(1..=99),
        global = true
    )]
    id: u8,

    /// Override the 9600 baud default.
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Print rejected responses instead of failing on them.
    #[arg(long, global = true)]
    no_raise: bool,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute named commands in order and print each response.
    Run {
        /// Command names as printed by `list` (dashes or underscores).
        #[arg(required = true, num_args = 1..)]
        commands: Vec<String>,
    },

    /// Print transport mode, power state and tuner mode.
    Status,

    /// Stop, rewind, and wait for the rewind to finish.
    RewindWait {
        /// Give up after this many seconds of polling.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Stop, eject, and wait until the tape is out.
    EjectWait {
        /// Give up after this many seconds of polling.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Assign a new JLIP id to the deck.
    SetId {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=99))]
        new_id: u8,
    },

    /// Tune to a channel (1-99).
    Channel {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=99))]
        channel: u8,
    },

    /// Find the first responsive JLIP id that has no device node yet.
    Probe {
        /// An id counts as claimed when `<prefix><id>` exists.
        #[arg(long, default_value = "/dev/jlip")]
        claimed_prefix: String,
    },

    /// List the command names accepted by `run`.
    List,
}

// ---------------------------------------------------------------------------
// Connection helpers
// ---------------------------------------------------------------------------

fn builder(cli: &Cli) -> Result<VcrBuilder> {
    let port = cli
        .port
        .as_deref()
        .context("--port is required (or set VCRTOOL_PORT)")?;

    let mut builder = VcrBuilder::new()
        .serial_port(port)
        .jlip_id(cli.id)
        .raise_on_error_response(!cli.no_raise);
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }
    Ok(builder)
}

async fn create_vcr(cli: &Cli) -> Result<JlipVcr> {
    builder(cli)?
        .build()
        .await
        .with_context(|| format!("failed to open JLIP deck {} on {:?}", cli.id, cli.port))
}

async fn create_link(cli: &Cli) -> Result<JlipLink> {
    builder(cli)?
        .build_link()
        .await
        .with_context(|| format!("failed to open JLIP bus on {:?}", cli.port))
}

async fn close_transport(transport: jlip_core::Result<Box<dyn Transport>>) {
    if let Ok(mut transport) = transport {
        transport.close().await.ok();
    }
}

/// Split `names` into known commands and the names that matched nothing.
fn parse_commands(names: &[String]) -> (Vec<VcrCommand>, Vec<String>) {
    let mut known = Vec::new();
    let mut unknown = Vec::new();
    for name in names {
        match name.parse::<VcrCommand>() {
            Ok(command) => known.push(command),
            Err(_) => unknown.push(name.clone()),
        }
    }
    (known, unknown)
}

fn wait_policy(base: WaitPolicy, timeout: Option<u64>) -> WaitPolicy {
    match timeout {
        Some(secs) => base.with_timeout(Duration::from_secs(secs)),
        None => base,
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_list() -> Result<()> {
    for command in VcrCommand::ALL {
        println!("{}", command.name().replace('_', "-"));
    }
    Ok(())
}

async fn cmd_run(vcr: &JlipVcr, names: &[String]) -> Result<()> {
    let (commands, unknown) = parse_commands(names);
    for name in &unknown {
        eprintln!("unknown command '{name}', skipping (see `vcrtool list`)");
    }

    for command in commands {
        debug!(%command, "executing");
        let response = vcr
            .execute(command)
            .await
            .with_context(|| format!("{command} failed"))?;
        println!("{command}: {response}");
    }
    Ok(())
}

async fn cmd_status(vcr: &JlipVcr) -> Result<()> {
    let mode = vcr.get_vtr_mode(false).await.context("VTR mode query failed")?;
    println!("vtr mode:    {mode}");

    let power = vcr
        .get_power_state()
        .await
        .context("power state query failed")?;
    println!("power:       {power}");

    let tuner = vcr
        .get_tuner_mode()
        .await
        .context("tuner mode query failed")?;
    println!("tuner:       {tuner}");
    Ok(())
}

async fn cmd_rewind_wait(vcr: &JlipVcr, timeout: Option<u64>) -> Result<()> {
    let response = vcr
        .rewind_and_wait_with(wait_policy(WaitPolicy::rewind(), timeout))
        .await
        .context("rewind did not complete")?;
    println!("{response}");
    Ok(())
}

async fn cmd_eject_wait(vcr: &JlipVcr, timeout: Option<u64>) -> Result<()> {
    let response = vcr
        .eject_and_wait_with(wait_policy(WaitPolicy::eject(), timeout))
        .await
        .context("eject did not complete")?;
    println!("{response}");
    Ok(())
}

async fn cmd_set_id(vcr: &JlipVcr, new_id: u8) -> Result<()> {
    let response = vcr
        .set_jlip_id(new_id)
        .await
        .with_context(|| format!("failed to set JLIP id {new_id}"))?;
    println!("{response}");
    info!(old_id = vcr.jlip_id(), new_id, "JLIP id changed; use --id {new_id} from now on");
    Ok(())
}

async fn cmd_channel(vcr: &JlipVcr, channel: u8) -> Result<()> {
    let response = vcr
        .set_channel(channel)
        .await
        .with_context(|| format!("failed to tune channel {channel}"))?;
    println!("{response}");
    Ok(())
}

async fn cmd_probe(link: &JlipLink, claimed_prefix: &str) -> Result<()> {
    let claimed = |id: u8| Path::new(&format!("{claimed_prefix}{id}")).exists();
    match find_unclaimed(link, JLIP_ID_RANGE, claimed)
        .await
        .context("probe failed")?
    {
        Some(id) => {
            println!("{id}");
            Ok(())
        }
        None => bail!("no unclaimed JLIP device found"),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    // `list` does not need a port.
    if matches!(cli.command, Command::List) {
        return cmd_list();
    }

    // `probe` addresses many ids, so it works on the bare link.
    if let Command::Probe { claimed_prefix } = &cli.command {
        let link = create_link(&cli).await?;
        let result = cmd_probe(&link, claimed_prefix).await;
        close_transport(link.shutdown().await).await;
        return result;
    }

    let vcr = create_vcr(&cli).await?;

    let result = match &cli.command {
        Command::Run { commands } => cmd_run(&vcr, commands).await,
        Command::Status => cmd_status(&vcr).await,
        Command::RewindWait { timeout } => cmd_rewind_wait(&vcr, *timeout).await,
        Command::EjectWait { timeout } => cmd_eject_wait(&vcr, *timeout).await,
        Command::SetId { new_id } => cmd_set_id(&vcr, *new_id).await,
        Command::Channel { channel } => cmd_channel(&vcr, *channel).await,
        Command::Probe { .. } | Command::List => unreachable!("handled above"),
    };

    close_transport(vcr.shutdown().await).await;
    result
}
