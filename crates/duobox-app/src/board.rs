//! Contracts for the hardware and stacks the controller drives.
//!
//! A board binary implements these over its HAL and hands them to
//! [`AppContext::boot`](crate::AppContext::boot) as [`Peripherals`].

use crate::events::{LinkEvents, PeerAddress};
use crate::storage::SettingsStore;
use bass_boost::AudioSink;
use core::fmt::Debug;
use embedded_hal_async::delay::DelayNs;

/// Power amplifier on I2C.
pub trait Amplifier {
    type Error: Debug;

    fn init(&mut self) -> Result<(), Self::Error>;

    /// Write a level in driver units. Smaller is louder.
    fn set_volume(&mut self, driver_units: u8) -> Result<(), Self::Error>;
}

/// MP3 decoder. The decoder does not own its input or its sink; both are
/// handed in on every call so neither can be dropped while it runs.
pub trait Decoder {
    type Input;

    /// Start decoding `input` into `sink`. Returns `false` on failure.
    fn begin<S: AudioSink>(&mut self, input: &mut Self::Input, sink: &mut S) -> bool;

    /// Decode one step. Returns `false` when the stream ended or failed.
    fn step<S: AudioSink>(&mut self, input: &mut Self::Input, sink: &mut S) -> bool;

    fn is_running(&self) -> bool;

    fn stop(&mut self);
}

/// Network source, read-ahead buffer and decoder factory.
pub trait StreamBackend {
    type Error: Debug;
    /// Open stream connection.
    type Source;
    /// Read-ahead buffer that owns its source.
    type Buffer;
    type Decoder: Decoder<Input = Self::Buffer>;

    fn open(&mut self, url: &str) -> Result<Self::Source, Self::Error>;

    fn buffer(
        &mut self,
        source: Self::Source,
        capacity: usize,
    ) -> Result<Self::Buffer, Self::Error>;

    fn decoder(&mut self) -> Self::Decoder;
}

/// A2DP sink stack.
pub trait BluetoothSink {
    type Error: Debug;

    /// Register the queue the stack's connection callback reports into.
    fn listen(&mut self, events: &'static LinkEvents);

    /// With output inactive the stack stays connectable but does not claim
    /// the I2S bus.
    fn set_output_active(&mut self, active: bool);

    fn start(&mut self, device_name: &str) -> Result<(), Self::Error>;

    /// Returns `true` if the reconnect was accepted.
    fn connect_to(&mut self, peer: &PeerAddress) -> bool;

    /// Stack-side volume, 0..=127.
    fn volume(&self) -> u8;

    fn set_volume(&mut self, volume: u8);
}

/// Wi-Fi station interface. Provisioning happens behind `connect`.
pub trait Network {
    /// Join the provisioned network. Returns `true` when connected.
    fn connect(&mut self) -> bool;

    fn is_connected(&self) -> bool;

    /// Turn the radio off.
    fn disable(&mut self);
}

/// ADC on the resistor ladder.
pub trait ButtonLadder {
    fn read_raw(&mut self) -> u16;
}

/// Hardware quadrature counter.
pub trait PulseCounter {
    fn init(&mut self);
    fn count(&mut self) -> i64;
    fn clear(&mut self);
}

pub trait System {
    /// Monotonic milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Reboot the device. On hardware this never returns; the controller
    /// stops touching peripherals after calling it either way.
    fn restart(&mut self);
}

/// Concrete collaborator types of one board.
pub trait Board {
    type Output: AudioSink;
    type Amplifier: Amplifier;
    type Stream: StreamBackend;
    type Bluetooth: BluetoothSink;
    type Network: Network;
    type Store: SettingsStore;
    type Button: ButtonLadder;
    type Encoder: PulseCounter;
    type System: System;
    type Delay: DelayNs;
}

/// Everything [`AppContext::boot`](crate::AppContext::boot) takes ownership of.
pub struct Peripherals<B: Board> {
    pub output: B::Output,
    pub amplifier: B::Amplifier,
    pub stream: B::Stream,
    pub bluetooth: B::Bluetooth,
    pub network: B::Network,
    pub store: B::Store,
    pub button: B::Button,
    pub encoder: B::Encoder,
    pub system: B::System,
    pub delay: B::Delay,
}
