/// Logical namespace every key below lives in.
pub const NAMESPACE: &str = "audio_config";

/// Persisted settings of the `audio_config` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKey {
    AudioMode,
    RadioUrl,
    AudioVolume,
    LastPeerAddress,
}

impl StorageKey {
    /// Key name as used in logs and by string-keyed stores.
    pub fn name(&self) -> &'static str {
        match self {
            StorageKey::AudioMode => "audio_mode",
            StorageKey::RadioUrl => "radio_url",
            StorageKey::AudioVolume => "audio_volume",
            StorageKey::LastPeerAddress => "last_bt_addr",
        }
    }

    fn offset(&self) -> u16 {
        match self {
            StorageKey::AudioMode => 0x00,
            StorageKey::RadioUrl => 0x01,
            StorageKey::AudioVolume => 0x02,
            StorageKey::LastPeerAddress => 0x03,
        }
    }
}

impl From<StorageKey> for u16 {
    fn from(key: StorageKey) -> u16 {
        const BASE: u16 = 0x0100;
        BASE + key.offset()
    }
}
