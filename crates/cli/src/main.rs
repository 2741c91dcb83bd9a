//! DTU platform simulator CLI.
//!
//! This binary drives a two-core message ping over the simulated NoC. It performs:
//! 1. **Setup:** Loads a JSON configuration (or the defaults) and builds the platform.
//! 2. **Ping:** Core 0 sends a message to core 1, which consumes it and replies; core 0
//!    consumes the reply. Every step goes through the local cores' register interface.
//! 3. **Report:** Prints per-unit statistics (text or JSON) and any recorded faults.

use std::error::Error;
use std::process;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use dtusim_core::common::{CoreId, EpId};
use dtusim_core::config::{Config, TimingMode};
use dtusim_core::dtu::{Command, CommandOpcode, EndpointConfig, EpReg};
use dtusim_core::soc::traits::Device;
use dtusim_core::Platform;

/// Scratchpad address of the outgoing message on both cores.
const MESSAGE_ADDR: u64 = 0x0;
/// Scratchpad address of the receive rings on both cores.
const BUFFER_ADDR: u64 = 0x1000;
/// Endpoint core 0 transmits on and core 1 receives on.
const PING_EP: EpId = 0;
/// Endpoint core 1 transmits on and core 0 receives on.
const PONG_EP: EpId = 1;

#[derive(Parser, Debug)]
#[command(
    name = "dtusim",
    author,
    version,
    about = "DTU message-passing simulator",
    long_about = "Simulate data transfer units moving messages between cores over a network-on-chip.\n\nExamples:\n  dtusim run\n  dtusim run --atomic --messages 16 --size 128\n  dtusim run --config platform.json --json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping messages between core 0 and core 1.
    Run {
        /// JSON configuration file (defaults are used when omitted).
        #[arg(short, long)]
        config: Option<String>,

        /// Run in atomic mode instead of timed mode.
        #[arg(long)]
        atomic: bool,

        /// Number of ping-pong rounds.
        #[arg(short, long, default_value_t = 4)]
        messages: u32,

        /// Payload size in bytes.
        #[arg(short, long, default_value_t = 64)]
        size: u64,

        /// Receive ring capacity in slots.
        #[arg(long, default_value_t = 4)]
        slots: u64,

        /// Print per-unit statistics as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            atomic,
            messages,
            size,
            slots,
            json,
        } => {
            let opts = RunOptions {
                config,
                atomic,
                messages,
                size,
                slots,
                json,
            };
            match cmd_run(&opts) {
                Ok(true) => {}
                Ok(false) => process::exit(1),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            }
        }
    }
}

#[derive(Debug)]
struct RunOptions {
    config: Option<String>,
    atomic: bool,
    messages: u32,
    size: u64,
    slots: u64,
    json: bool,
}

/// Installs the log subscriber; `RUST_LOG` overrides the level chosen by the config.
fn init_tracing(trace: bool) {
    let default_level = if trace { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs the ping-pong and reports.
///
/// # Returns
///
/// `true` if every round completed without faults.
fn cmd_run(opts: &RunOptions) -> Result<bool, Box<dyn Error>> {
    let mut config = match &opts.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if opts.atomic {
        config.general.mode = TimingMode::Atomic;
    }
    config.system.num_cores = config.system.num_cores.max(2);
    config.validate()?;
    init_tracing(config.general.trace);

    let mut platform = Platform::new(&config)?;
    setup(&mut platform, opts)?;

    println!(
        "Configuration: {:?} mode, {} cores, {} endpoints, slot size {} bytes",
        config.general.mode,
        platform.num_cores(),
        config.dtu.num_endpoints,
        config.dtu.max_message_size
    );
    println!(
        "  Rounds: {}  Payload: {} bytes  Ring: {} slots",
        opts.messages, opts.size, opts.slots
    );

    let mut ok = true;
    for round in 0..opts.messages {
        let payload = pattern(round, opts.size);
        ok &= transfer(&mut platform, 0, PING_EP, 1, PING_EP, &payload)?;
        ok &= transfer(&mut platform, 1, PONG_EP, 0, PONG_EP, &payload)?;
        debug!(round, tick = platform.now(), "round complete");
    }
    info!(tick = platform.now(), "ping finished");

    for fault in platform.faults() {
        eprintln!(
            "[!] fault at tick {} on core {}: {}",
            fault.tick, fault.core, fault.error
        );
    }
    ok &= platform.faults().is_empty();

    if opts.json {
        let per_unit: Vec<_> = (0..platform.num_cores())
            .filter_map(|core| platform.dtu(core).map(|dtu| dtu.stats()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&per_unit)?);
    } else {
        platform.stats().print();
    }
    Ok(ok)
}

/// Configures the endpoints of both cores.
fn setup(platform: &mut Platform, opts: &RunOptions) -> Result<(), Box<dyn Error>> {
    let transmit = |target_core: u64, target_ep: EpId| EndpointConfig::Transmit {
        message_addr: MESSAGE_ADDR,
        message_size: opts.size,
        target_core,
        target_ep: target_ep as u64,
    };
    let receive = EndpointConfig::Receive {
        buffer_addr: BUFFER_ADDR,
        slots: opts.slots,
    };

    platform.configure_endpoint(0, PING_EP, &transmit(1, PING_EP))?;
    platform.configure_endpoint(1, PING_EP, &receive)?;
    platform.configure_endpoint(1, PONG_EP, &transmit(0, PONG_EP))?;
    platform.configure_endpoint(0, PONG_EP, &receive)?;
    Ok(())
}

/// Sends `payload` from `src` to `dst` and lets the receiving core consume it.
///
/// # Returns
///
/// `true` if the message arrived intact.
fn transfer(
    platform: &mut Platform,
    src: CoreId,
    src_ep: EpId,
    dst: CoreId,
    dst_ep: EpId,
    payload: &[u8],
) -> Result<bool, Box<dyn Error>> {
    if let Some(spm) = platform.spm_mut(src) {
        spm.write_bytes(MESSAGE_ADDR, payload);
    }

    platform.write_command(src, &Command::new(CommandOpcode::StartOperation, src_ep, 0))?;
    let _ = platform.run();
    if platform.status(src)? != 0 {
        eprintln!("[!] core {src} still busy after transfer");
        return Ok(false);
    }

    let slot = platform.cpu_read(dst, platform.ep_reg_addr(dst_ep, EpReg::BufferReadPtr))?;
    let count = platform.cpu_read(dst, platform.ep_reg_addr(dst_ep, EpReg::BufferMessageCount))?;
    let header_len = dtusim_core::dtu::MessageHeader::SIZE;
    let intact = count > 0
        && platform
            .spm(dst)
            .and_then(|spm| spm.slice(slot + header_len as u64, payload.len()))
            .is_some_and(|received| received == payload);
    if !intact {
        eprintln!("[!] message from core {src} did not arrive intact at core {dst}");
        return Ok(false);
    }

    platform.write_command(dst, &Command::new(CommandOpcode::IncrementReadPtr, dst_ep, 0))?;
    let _ = platform.run();
    Ok(true)
}

/// Deterministic payload for one round.
fn pattern(round: u32, size: u64) -> Vec<u8> {
    (0..size)
        .map(|i| (i as u32).wrapping_mul(31).wrapping_add(round) as u8)
        .collect()
}
