//! Configuration system for the DTU simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline unit constants (endpoints, message size, command layout, latencies).
//! 2. **Structures:** Hierarchical config for general, system, DTU, scratchpad and NoC.
//! 3. **Validation:** `Config::validate` rejects layouts the hardware could not represent.
//!
//! Configuration is supplied as JSON (`Config::from_json_str`, `Config::from_json_file`)
//! or built with `Config::default()`. Every field may be omitted and falls back to its default.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::ConfigError;
use crate::common::constants::{HEADER_SIZE, MAX_HEADER_CORE_ID, MAX_HEADER_EP_ID, REG_BITS};

/// Default configuration constants for the simulator.
///
/// These values define the baseline unit configuration when not
/// explicitly overridden in the JSON configuration.
mod defaults {
    /// Simulated clock period in ticks (1 ns at 1 tick = 1 ps).
    pub const CLOCK_PERIOD: u64 = 1000;

    /// Number of cores (tiles) on the platform.
    pub const NUM_CORES: usize = 2;

    /// Number of endpoints per DTU.
    pub const NUM_ENDPOINTS: usize = 8;

    /// Maximum message size in bytes, header included.
    ///
    /// Also the size of one slot of a receive ring buffer.
    pub const MAX_MESSAGE_SIZE: u64 = 512;

    /// Width of the opcode field of the command register.
    pub const CMD_OPCODE_BITS: u32 = 2;

    /// Width of the endpoint id field of the command register.
    pub const CMD_EPID_BITS: u32 = 8;

    /// Width of the offset field of the command register.
    pub const CMD_OFFSET_BITS: u32 = 32;

    /// Base address of the DTU register file in the local core's address space.
    pub const CPU_BASE_ADDR: u64 = 0xF000_0000;

    /// Number of low-order NoC address bits holding the endpoint id.
    pub const NOC_EP_ADDR_BITS: u32 = 8;

    /// Cycles between a register access arriving and its response (and command execution).
    pub const REGISTER_ACCESS_LATENCY: u64 = 1;

    /// Cycles between command execution and the scratchpad read of the message.
    pub const COMMAND_TO_SPM_REQUEST_LATENCY: u64 = 1;

    /// Cycles between the scratchpad read response and the NoC request.
    pub const SPM_RESPONSE_TO_NOC_REQUEST_LATENCY: u64 = 1;

    /// Cycles between an inbound NoC request and the scratchpad write.
    pub const NOC_REQUEST_TO_SPM_REQUEST_LATENCY: u64 = 1;

    /// Cycles between the scratchpad write response and the NoC response.
    pub const SPM_RESPONSE_TO_NOC_RESPONSE_LATENCY: u64 = 1;

    /// Scratchpad size in bytes (64 KiB).
    pub const SPM_SIZE: usize = 64 * 1024;

    /// Scratchpad access latency in cycles.
    pub const SPM_LATENCY: u64 = 2;

    /// NoC link width in bytes per cycle.
    pub const NOC_WIDTH: u64 = 16;

    /// NoC base latency in cycles per packet.
    pub const NOC_LATENCY: u64 = 4;
}

/// Timing mode of the whole platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TimingMode {
    /// Zero-delay execution.
    ///
    /// Every pipeline collapses into one synchronous call chain inside the trigger
    /// (register write or frame arrival). No event is left pending.
    Atomic,
    /// Event-driven execution.
    ///
    /// Every pipeline leg is scheduled at a future tick according to the configured
    /// latencies and the transport delays carried by packets.
    #[default]
    Timed,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use dtusim_core::config::{Config, TimingMode};
///
/// let json = r#"{
///     "general": { "mode": "Atomic" },
///     "system": { "num_cores": 4 },
///     "dtu": {
///         "num_endpoints": 16,
///         "max_message_size": 256,
///         "latency": { "register_access": 2 }
///     },
///     "noc": { "width_bytes": 8 }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.general.mode, TimingMode::Atomic);
/// assert_eq!(config.system.num_cores, 4);
/// assert_eq!(config.dtu.latency.register_access, 2);
/// assert_eq!(config.dtu.latency.command_to_spm_request, 1);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Platform composition
    #[serde(default)]
    pub system: SystemConfig,
    /// Data transfer unit parameters
    #[serde(default)]
    pub dtu: DtuConfig,
    /// Scratchpad memory parameters
    #[serde(default)]
    pub spm: SpmConfig,
    /// Network-on-chip parameters
    #[serde(default)]
    pub noc: NocConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Arguments
    ///
    /// * `json` - The configuration document.
    ///
    /// # Returns
    ///
    /// The validated configuration, or the parse/validation error.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks that the configuration describes hardware the unit can represent.
    ///
    /// Violations are startup errors: the command layout must fit into one register,
    /// endpoint and core ids must fit into the command, the NoC address and the message
    /// header, and a slot must be larger than the header.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.clock_period == 0 {
            return Err(invalid("general.clock_period", 0, "must be non-zero"));
        }

        let cores = self.system.num_cores as u64;
        if cores == 0 {
            return Err(invalid("system.num_cores", cores, "must be non-zero"));
        }
        if cores - 1 > MAX_HEADER_CORE_ID {
            return Err(invalid(
                "system.num_cores",
                cores,
                "core ids must fit into the 8-bit header field",
            ));
        }

        self.dtu.validate()?;

        if self.spm.size == 0 {
            return Err(invalid("spm.size", 0, "must be non-zero"));
        }
        if self.noc.width_bytes == 0 {
            return Err(invalid("noc.width_bytes", 0, "must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: u64, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        value,
        reason,
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Atomic (zero-delay) or timed (event-driven) execution
    #[serde(default)]
    pub mode: TimingMode,

    /// Clock period of every unit in ticks
    #[serde(default = "GeneralConfig::default_clock_period")]
    pub clock_period: u64,

    /// Raise the default log filter to `debug` (pipeline transitions)
    #[serde(default)]
    pub trace: bool,
}

impl GeneralConfig {
    /// Returns the default clock period.
    fn default_clock_period() -> u64 {
        defaults::CLOCK_PERIOD
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            mode: TimingMode::default(),
            clock_period: defaults::CLOCK_PERIOD,
            trace: false,
        }
    }
}

/// Platform composition.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Number of cores, each with one DTU and one scratchpad
    #[serde(default = "SystemConfig::default_num_cores")]
    pub num_cores: usize,
}

impl SystemConfig {
    /// Returns the default core count.
    fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            num_cores: defaults::NUM_CORES,
        }
    }
}

/// Data transfer unit parameters.
///
/// Shared by every DTU on the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct DtuConfig {
    /// Number of endpoints per unit
    #[serde(default = "DtuConfig::default_num_endpoints")]
    pub num_endpoints: usize,

    /// Maximum message size in bytes (header included); also the ring slot size
    #[serde(default = "DtuConfig::default_max_message_size")]
    pub max_message_size: u64,

    /// Width of the command register's opcode field
    #[serde(default = "DtuConfig::default_opcode_bits")]
    pub num_cmd_opcode_bits: u32,

    /// Width of the command register's endpoint id field
    #[serde(default = "DtuConfig::default_epid_bits")]
    pub num_cmd_epid_bits: u32,

    /// Width of the command register's offset field
    #[serde(default = "DtuConfig::default_offset_bits")]
    pub num_cmd_offset_bits: u32,

    /// MMIO base address of the register file as seen by the local core
    #[serde(default = "DtuConfig::default_cpu_base_addr")]
    pub cpu_base_addr: u64,

    /// Number of low-order NoC address bits holding the endpoint id
    #[serde(default = "DtuConfig::default_noc_ep_addr_bits")]
    pub noc_ep_addr_bits: u32,

    /// Pipeline latencies in cycles
    #[serde(default)]
    pub latency: LatencyConfig,
}

impl DtuConfig {
    /// Returns the default endpoint count.
    fn default_num_endpoints() -> usize {
        defaults::NUM_ENDPOINTS
    }

    /// Returns the default maximum message size.
    fn default_max_message_size() -> u64 {
        defaults::MAX_MESSAGE_SIZE
    }

    /// Returns the default opcode field width.
    fn default_opcode_bits() -> u32 {
        defaults::CMD_OPCODE_BITS
    }

    /// Returns the default endpoint id field width.
    fn default_epid_bits() -> u32 {
        defaults::CMD_EPID_BITS
    }

    /// Returns the default offset field width.
    fn default_offset_bits() -> u32 {
        defaults::CMD_OFFSET_BITS
    }

    /// Returns the default MMIO base address.
    fn default_cpu_base_addr() -> u64 {
        defaults::CPU_BASE_ADDR
    }

    /// Returns the default number of NoC endpoint address bits.
    fn default_noc_ep_addr_bits() -> u32 {
        defaults::NOC_EP_ADDR_BITS
    }

    /// Validates the unit parameters on their own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let used = u64::from(self.num_cmd_opcode_bits)
            + u64::from(self.num_cmd_epid_bits)
            + u64::from(self.num_cmd_offset_bits);
        if used > u64::from(REG_BITS) || self.num_cmd_opcode_bits == 0 {
            return Err(ConfigError::CommandLayout {
                opcode: self.num_cmd_opcode_bits,
                epid: self.num_cmd_epid_bits,
                offset: self.num_cmd_offset_bits,
                width: REG_BITS,
            });
        }

        let eps = self.num_endpoints as u64;
        if eps == 0 {
            return Err(invalid("dtu.num_endpoints", 0, "must be non-zero"));
        }
        if (eps - 1) >> self.num_cmd_epid_bits != 0 {
            return Err(invalid(
                "dtu.num_endpoints",
                eps,
                "endpoint ids must fit into the command's epid field",
            ));
        }
        if self.noc_ep_addr_bits == 0 || self.noc_ep_addr_bits >= 32 {
            return Err(invalid(
                "dtu.noc_ep_addr_bits",
                u64::from(self.noc_ep_addr_bits),
                "must be between 1 and 31",
            ));
        }
        if (eps - 1) >> self.noc_ep_addr_bits != 0 {
            return Err(invalid(
                "dtu.num_endpoints",
                eps,
                "endpoint ids must fit into the NoC endpoint address bits",
            ));
        }
        if eps - 1 > MAX_HEADER_EP_ID {
            return Err(invalid(
                "dtu.num_endpoints",
                eps,
                "endpoint ids must fit into the 8-bit header field",
            ));
        }
        if self.max_message_size <= HEADER_SIZE as u64 {
            return Err(invalid(
                "dtu.max_message_size",
                self.max_message_size,
                "must be larger than the message header",
            ));
        }
        if self.max_message_size - HEADER_SIZE as u64 > u64::from(u16::MAX) {
            return Err(invalid(
                "dtu.max_message_size",
                self.max_message_size,
                "payload length must fit into the 16-bit header field",
            ));
        }
        Ok(())
    }
}

impl Default for DtuConfig {
    fn default() -> Self {
        Self {
            num_endpoints: defaults::NUM_ENDPOINTS,
            max_message_size: defaults::MAX_MESSAGE_SIZE,
            num_cmd_opcode_bits: defaults::CMD_OPCODE_BITS,
            num_cmd_epid_bits: defaults::CMD_EPID_BITS,
            num_cmd_offset_bits: defaults::CMD_OFFSET_BITS,
            cpu_base_addr: defaults::CPU_BASE_ADDR,
            noc_ep_addr_bits: defaults::NOC_EP_ADDR_BITS,
            latency: LatencyConfig::default(),
        }
    }
}

/// Pipeline latencies of a DTU, in cycles.
#[derive(Debug, Clone, Deserialize)]
pub struct LatencyConfig {
    /// Register access to response / command execution
    #[serde(default = "LatencyConfig::default_register_access")]
    pub register_access: u64,

    /// Command execution to scratchpad read of the message
    #[serde(default = "LatencyConfig::default_command_to_spm_request")]
    pub command_to_spm_request: u64,

    /// Scratchpad read response to outbound NoC request
    #[serde(default = "LatencyConfig::default_spm_response_to_noc_request")]
    pub spm_response_to_noc_request: u64,

    /// Inbound NoC request to scratchpad write
    #[serde(default = "LatencyConfig::default_noc_request_to_spm_request")]
    pub noc_request_to_spm_request: u64,

    /// Scratchpad write response to NoC response
    #[serde(default = "LatencyConfig::default_spm_response_to_noc_response")]
    pub spm_response_to_noc_response: u64,
}

impl LatencyConfig {
    fn default_register_access() -> u64 {
        defaults::REGISTER_ACCESS_LATENCY
    }

    fn default_command_to_spm_request() -> u64 {
        defaults::COMMAND_TO_SPM_REQUEST_LATENCY
    }

    fn default_spm_response_to_noc_request() -> u64 {
        defaults::SPM_RESPONSE_TO_NOC_REQUEST_LATENCY
    }

    fn default_noc_request_to_spm_request() -> u64 {
        defaults::NOC_REQUEST_TO_SPM_REQUEST_LATENCY
    }

    fn default_spm_response_to_noc_response() -> u64 {
        defaults::SPM_RESPONSE_TO_NOC_RESPONSE_LATENCY
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            register_access: defaults::REGISTER_ACCESS_LATENCY,
            command_to_spm_request: defaults::COMMAND_TO_SPM_REQUEST_LATENCY,
            spm_response_to_noc_request: defaults::SPM_RESPONSE_TO_NOC_REQUEST_LATENCY,
            noc_request_to_spm_request: defaults::NOC_REQUEST_TO_SPM_REQUEST_LATENCY,
            spm_response_to_noc_response: defaults::SPM_RESPONSE_TO_NOC_RESPONSE_LATENCY,
        }
    }
}

/// Scratchpad memory parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SpmConfig {
    /// Scratchpad size in bytes (addresses `0..size`)
    #[serde(default = "SpmConfig::default_size")]
    pub size: usize,

    /// Access latency in cycles
    #[serde(default = "SpmConfig::default_latency")]
    pub latency: u64,
}

impl SpmConfig {
    /// Returns the default scratchpad size.
    fn default_size() -> usize {
        defaults::SPM_SIZE
    }

    /// Returns the default scratchpad latency.
    fn default_latency() -> u64 {
        defaults::SPM_LATENCY
    }
}

impl Default for SpmConfig {
    fn default() -> Self {
        Self {
            size: defaults::SPM_SIZE,
            latency: defaults::SPM_LATENCY,
        }
    }
}

/// Network-on-chip parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct NocConfig {
    /// Link width in bytes per cycle
    #[serde(default = "NocConfig::default_width")]
    pub width_bytes: u64,

    /// Base latency per packet in cycles
    #[serde(default = "NocConfig::default_latency")]
    pub latency_cycles: u64,
}

impl NocConfig {
    /// Returns the default link width.
    fn default_width() -> u64 {
        defaults::NOC_WIDTH
    }

    /// Returns the default base latency.
    fn default_latency() -> u64 {
        defaults::NOC_LATENCY
    }
}

impl Default for NocConfig {
    fn default() -> Self {
        Self {
            width_bytes: defaults::NOC_WIDTH,
            latency_cycles: defaults::NOC_LATENCY,
        }
    }
}
