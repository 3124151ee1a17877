//! Debounced button ladder and quadrature encoder.

use crate::board::{ButtonLadder, PulseCounter};

/// Keys on the resistor ladder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    #[default]
    None,
    Key1,
    Key2,
    Key3,
}

impl Button {
    /// Buckets a raw ADC reading. Anything at or above the last threshold,
    /// including garbage, reads as no key.
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0..=99 => Button::Key1,
            100..=599 => Button::Key2,
            600..=999 => Button::Key3,
            _ => Button::None,
        }
    }
}

/// Accepts a reading once it has stayed unchanged for the whole interval.
///
/// Every change of the raw reading restarts the interval, so alternating
/// noise never gets through no matter how long it lasts.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    interval_ms: u64,
    last_reading: T,
    stable: T,
    last_change_ms: u64,
}

impl<T: Copy + PartialEq> Debouncer<T> {
    pub fn new(initial: T, interval_ms: u64, now_ms: u64) -> Self {
        Self {
            interval_ms,
            last_reading: initial,
            stable: initial,
            last_change_ms: now_ms,
        }
    }

    /// Feed one raw reading and return the stable value.
    pub fn update(&mut self, reading: T, now_ms: u64) -> T {
        if reading != self.last_reading {
            self.last_reading = reading;
            self.last_change_ms = now_ms;
        }
        if now_ms.saturating_sub(self.last_change_ms) >= self.interval_ms {
            self.stable = self.last_reading;
        }
        self.stable
    }

    pub fn stable(&self) -> T {
        self.stable
    }
}

/// Turns an absolute pulse count into per-poll deltas.
#[derive(Debug, Clone, Default)]
pub struct EncoderTracker {
    last: i64,
}

impl EncoderTracker {
    pub fn new(count: i64) -> Self {
        Self { last: count }
    }

    /// Returns the decrease since the previous call. The counter runs
    /// backwards on clockwise rotation with this wiring, so clockwise is
    /// positive.
    pub fn delta(&mut self, count: i64) -> i32 {
        let delta = self.last.saturating_sub(count);
        self.last = count;
        delta.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

/// Result of one input poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StableEvent {
    pub button: Button,
    pub encoder_delta: i32,
}

/// Both physical inputs with their debounce state.
pub struct Inputs<B, E> {
    button: B,
    encoder: E,
    debounce: Debouncer<Button>,
    tracker: EncoderTracker,
}

impl<B: ButtonLadder, E: PulseCounter> Inputs<B, E> {
    pub fn new(button: B, encoder: E, debounce_ms: u64, now_ms: u64) -> Self {
        Self {
            button,
            encoder,
            debounce: Debouncer::new(Button::None, debounce_ms, now_ms),
            tracker: EncoderTracker::default(),
        }
    }

    /// Start counting encoder pulses from zero.
    pub fn init_encoder(&mut self) {
        self.encoder.init();
        self.encoder.clear();
        self.tracker = EncoderTracker::new(self.encoder.count());
    }

    pub fn poll_encoder(&mut self) -> i32 {
        let count = self.encoder.count();
        self.tracker.delta(count)
    }

    pub fn poll_button(&mut self, now_ms: u64) -> Button {
        let raw = self.button.read_raw();
        self.debounce.update(Button::from_raw(raw), now_ms)
    }

    pub fn poll(&mut self, now_ms: u64) -> StableEvent {
        StableEvent {
            encoder_delta: self.poll_encoder(),
            button: self.poll_button(now_ms),
        }
    }

    pub fn button_mut(&mut self) -> &mut B {
        &mut self.button
    }

    pub fn encoder_mut(&mut self) -> &mut E {
        &mut self.encoder
    }
}
