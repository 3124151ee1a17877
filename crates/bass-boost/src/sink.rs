/// One interleaved stereo sample pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    pub const SILENCE: Self = Self { left: 0, right: 0 };

    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }
}

/// A node that accepts stereo frames: the raw I2S output, an effect stage
/// in front of it, or anything else a decoder can write into.
///
/// Implementors are interchangeable, so an effect can be inserted in front of
/// an output without the producer knowing.
pub trait AudioSink {
    type Error: core::fmt::Debug;

    /// Bring the node (and everything behind it) up.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Offer one frame.
    ///
    /// Returns `false` when the node cannot take the frame right now. The
    /// producer must offer the same frame again later.
    fn consume_frame(&mut self, frame: Frame) -> bool;
}

impl<S: AudioSink + ?Sized> AudioSink for &mut S {
    type Error = S::Error;

    #[inline]
    fn begin(&mut self) -> Result<(), Self::Error> {
        (**self).begin()
    }

    #[inline]
    fn consume_frame(&mut self, frame: Frame) -> bool {
        (**self).consume_frame(frame)
    }
}
