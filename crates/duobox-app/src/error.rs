/// Failures the controller reports to its caller.
///
/// Collaborator errors are logged where they happen and collapsed into one
/// of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Stream requested while the network is down.
    NoNetwork,
    /// The network source could not open the URL.
    StreamOpen,
    /// The decoder refused to start on the new pipeline.
    DecoderStart,
    /// The audio output did not come up.
    OutputInit,
    /// Amplifier init failed; audio output is unavailable.
    AmplifierInit,
    /// A volume write to the amplifier failed.
    Amplifier,
    /// Reading or writing persisted settings failed.
    Storage,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::NoNetwork => "network not connected",
            Error::StreamOpen => "stream source could not be opened",
            Error::DecoderStart => "decoder failed to start",
            Error::OutputInit => "audio output failed to start",
            Error::AmplifierInit => "amplifier init failed",
            Error::Amplifier => "amplifier write failed",
            Error::Storage => "settings storage failed",
        };
        f.write_str(msg)
    }
}
