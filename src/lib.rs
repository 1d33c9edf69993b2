//! Rust library for managing and controlling Elgato Key Light devices
//!
//! This library provides an async API for controlling Key Lights over their
//! local HTTP control API (port 9123). It supports:
//!
//! - Fetching and mutating device state (power, brightness, color temperature)
//! - A durable registry of known devices and their configured flags
//! - Keep-awake polling that stops devices from entering standby
//! - Registry-wide state polls with per-device partial results
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use keylight_control::{KeepAwakeScheduler, KeylightClient, LightRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load the registry (an absent store starts empty)
//!     let registry = Arc::new(LightRegistry::load("lights.json")?);
//!     let client = KeylightClient::new();
//!     let scheduler = KeepAwakeScheduler::new(registry.clone(), client.clone());
//!
//!     // Register a device and keep it awake
//!     registry.add("192.168.1.40", "Desk Light", true)?;
//!     scheduler.reconcile().await;
//!
//!     // Control it directly
//!     client.set_brightness("192.168.1.40", 35).await?;
//!     let state = client.fetch_state("192.168.1.40").await?;
//!     println!("brightness is now {}", state.brightness);
//!
//!     // Shut down cleanly: no poller outlives the process
//!     scheduler.stop_all().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Client**: HTTP GET/PUT against a device's `/elgato/lights` endpoint
//! - **Registry**: durable, address-keyed collection of known devices
//! - **Scheduler**: reconciliation-driven keep-awake polling tasks
//! - **Protocol**: the vendor's JSON document structures
//! - **Types**: domain types and data structures
//!
//! Web frontends, CLIs, and discovery layers sit on top of these and consume
//! nothing deeper than the public API.

mod client;
mod error;
mod protocol;
mod registry;
mod scheduler;
mod types;

// Public exports
pub use client::{KeylightClient, CONTROL_PORT};
pub use error::{KeylightError, Result};
pub use protocol::{LightStatus, LightUpdate, LightsDocument};
pub use registry::LightRegistry;
pub use scheduler::{KeepAwakeScheduler, DEFAULT_POLL_INTERVAL};
pub use types::{DeviceAddress, DeviceRecord, DeviceState};
