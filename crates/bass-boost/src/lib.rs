#![cfg_attr(not(test), no_std)]
//! Bass boost stage for 16-bit stereo audio chains.
//!
//! [`BassBoost`] sits between a producer (typically an MP3 decoder) and the
//! next [`AudioSink`], usually the I2S output. Each frame is normalized to
//! `[-1.0, 1.0]`, run through a per-channel low-shelf biquad, clamped, and
//! forwarded.

mod shelf;
mod sink;

pub use shelf::{ChannelState, Coefficients};
pub use sink::{AudioSink, Frame};

/// Fixed rate of the output path.
pub const SAMPLE_RATE_HZ: f32 = 44_100.0;

pub const MIN_GAIN_DB: f32 = -15.0;
pub const MAX_GAIN_DB: f32 = 15.0;

pub const MIN_CUTOFF_HZ: f32 = 1.0;
pub const MAX_CUTOFF_HZ: f32 = SAMPLE_RATE_HZ * 0.45;

const FROM_I16: f32 = 1.0 / 32768.0;
const TO_I16: f32 = 32767.0;

/// Low-shelf filter stage in front of another sink.
pub struct BassBoost<S> {
    next: S,
    gain_db: f32,
    cutoff_hz: f32,
    coefficients: Coefficients,
    left: ChannelState,
    right: ChannelState,
    /// Last offered frame and its filtered result, while the next node has
    /// not taken it.
    pending: Option<(Frame, Frame)>,
}

impl<S> BassBoost<S> {
    /// Gain is clamped to [`MIN_GAIN_DB`]..=[`MAX_GAIN_DB`], cutoff to
    /// [`MIN_CUTOFF_HZ`]..=[`MAX_CUTOFF_HZ`].
    pub fn new(next: S, gain_db: f32, cutoff_hz: f32) -> Self {
        let gain_db = gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB);
        let cutoff_hz = cutoff_hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
        Self {
            next,
            gain_db,
            cutoff_hz,
            coefficients: Coefficients::low_shelf(
                gain_db,
                cutoff_hz,
                SAMPLE_RATE_HZ,
            ),
            left: ChannelState::default(),
            right: ChannelState::default(),
            pending: None,
        }
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Filter history as `(left, right)`.
    pub fn state(&self) -> (ChannelState, ChannelState) {
        (self.left, self.right)
    }

    /// Recompute coefficients for a new gain. History is left as is, which
    /// can produce a short transient.
    pub fn set_gain(&mut self, gain_db: f32) {
        self.gain_db = gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB);
        self.recalculate();
    }

    /// Recompute coefficients for a new cutoff. History is left as is.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.coefficients = Coefficients::low_shelf(
            self.gain_db,
            self.cutoff_hz,
            SAMPLE_RATE_HZ,
        );
    }

    /// Filter one frame without forwarding it.
    pub fn process(&mut self, frame: Frame) -> Frame {
        let c = &self.coefficients;
        let left = self.left.step(c, frame.left as f32 * FROM_I16);
        let right = self.right.step(c, frame.right as f32 * FROM_I16);
        Frame::new(to_sample(left), to_sample(right))
    }

    /// Forget a filtered frame the next node refused. Filter history is
    /// kept. Call when the producer goes away.
    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    pub fn output(&self) -> &S {
        &self.next
    }

    pub fn output_mut(&mut self) -> &mut S {
        &mut self.next
    }

    pub fn into_output(self) -> S {
        self.next
    }
}

#[inline]
fn to_sample(y: f32) -> i16 {
    (y.clamp(-1.0, 1.0) * TO_I16) as i16
}

impl<S: AudioSink> AudioSink for BassBoost<S> {
    type Error = S::Error;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.next.begin()
    }

    fn consume_frame(&mut self, frame: Frame) -> bool {
        // A rejected frame comes back unchanged; resend the already filtered
        // result instead of advancing the history twice.
        let out = match self.pending.take() {
            Some((offered, out)) if offered == frame => out,
            _ => self.process(frame),
        };
        if self.next.consume_frame(out) {
            true
        } else {
            self.pending = Some((frame, out));
            false
        }
    }
}
