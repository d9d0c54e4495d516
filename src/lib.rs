//! md (Linux software RAID) telemetry collection for monitoring agents.
//!
//! This crate discovers md array devices under a sysfs block-device tree and
//! reads their per-array attribute files into JSON-serializable records, in
//! the discovery/stats shape expected by Zabbix-style monitoring systems.
//!
//! ## Modules
//!
//! - [`collect`]: Device enumeration and attribute collection from sysfs
//! - [`logging`]: Structured logging initialization for the CLI

#![forbid(unsafe_code)]

pub mod collect;
pub mod logging;

pub use collect::mdraid::{
    ArrayStats, DiscoveredDevice, MdStats, MdraidCollector, MdraidError, DEFAULT_SYS_BLOCK,
};
pub use logging::{init_logging, LogConfig, LogFormat, LoggingGuards};
