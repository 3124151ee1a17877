/// Capacity of a stored stream URL.
pub const MAX_URL_LEN: usize = 128;

pub type Url = heapless::String<MAX_URL_LEN>;

/// Built-in stations. Entry 0 is the fallback URL, keys 2 and 3 select
/// entries 1 and 2.
pub const STATIONS: [&str; 3] = [
    "http://st01.dlf.de/dlf/01/128/mp3/stream.mp3",
    "http://st03.dlf.de/dlf/03/128/mp3/stream.mp3",
    "http://www.radioeins.de/livemp3",
];

pub const DEVICE_NAME: &str = "DuoBox";

pub const BASS_GAIN_DB: f32 = 10.0;
pub const BASS_CUTOFF_HZ: f32 = 140.0;

/// Read-ahead buffer between the network source and the decoder.
pub const STREAM_BUFFER_SIZE: usize = 16 * 1024;

pub const DEBOUNCE_MS: u64 = 50;
pub const LOOP_YIELD_MS: u32 = 10;
pub const STREAM_RETRY_MS: u32 = 200;
pub const BLUETOOTH_SETTLE_MS: u32 = 500;

/// Amplifier level forced while the phone controls the volume.
pub const BLUETOOTH_AMP_PERCENT: u8 = 90;

/// Upper end of the Bluetooth stack's own volume scale.
pub const BT_VOLUME_MAX: u8 = 127;

/// Returns built-in station `index` as an owned URL.
pub fn station(index: usize) -> Option<Url> {
    STATIONS.get(index).and_then(|s| Url::try_from(*s).ok())
}

/// Runtime parameters handed to [`AppContext::boot`](crate::AppContext::boot).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub device_name: &'static str,
    pub bass_gain_db: f32,
    pub bass_cutoff_hz: f32,
    pub stream_buffer_size: usize,
    pub debounce_ms: u64,
    pub loop_yield_ms: u32,
    pub stream_retry_ms: u32,
    pub bluetooth_settle_ms: u32,
    pub bluetooth_amp_percent: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME,
            bass_gain_db: BASS_GAIN_DB,
            bass_cutoff_hz: BASS_CUTOFF_HZ,
            stream_buffer_size: STREAM_BUFFER_SIZE,
            debounce_ms: DEBOUNCE_MS,
            loop_yield_ms: LOOP_YIELD_MS,
            stream_retry_ms: STREAM_RETRY_MS,
            bluetooth_settle_ms: BLUETOOTH_SETTLE_MS,
            bluetooth_amp_percent: BLUETOOTH_AMP_PERCENT,
        }
    }
}
