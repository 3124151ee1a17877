#![cfg_attr(not(test), no_std)]
//! Mode and signal-chain controller of a dual-mode internet radio /
//! Bluetooth speaker.
//!
//! The controller owns exactly one audio source at a time. Switching between
//! Radio, Bluetooth and Idle persists the target and restarts the device;
//! changing station or toggling the bass boost only rebuilds the radio
//! pipeline.

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod app;
pub mod board;
pub mod chain;
pub mod config;
mod error;
pub mod events;
pub mod input;
pub mod mode;
pub mod storage;
pub mod volume;

pub use app::AppContext;
pub use error::Error;

// Re-exports
pub use bass_boost::{AudioSink, BassBoost, Frame};
pub use board::{Board, Peripherals};
pub use config::Config;
pub use events::{Event, LinkEvent, LinkEvents, PeerAddress};
pub use mode::{Mode, ModeRequest, Transition};
