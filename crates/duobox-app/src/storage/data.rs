use super::StorageKey;
use crate::config::Url;
use crate::events::PeerText;
use sequential_storage::map::SerializationError;
use serde::{Deserialize, Serialize};

/// The values stored in the system, one variant per `StorageKey`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageData {
    AudioMode(u32),
    RadioUrl(Url),
    AudioVolume(u32),
    LastPeerAddress(PeerText),
}

impl StorageData {
    pub fn key(&self) -> StorageKey {
        match self {
            StorageData::AudioMode(_) => StorageKey::AudioMode,
            StorageData::RadioUrl(_) => StorageKey::RadioUrl,
            StorageData::AudioVolume(_) => StorageKey::AudioVolume,
            StorageData::LastPeerAddress(_) => StorageKey::LastPeerAddress,
        }
    }
}

/// Trait implementation to support serialization for `sequential_storage`.
impl<'a> sequential_storage::map::Value<'a> for StorageData {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, SerializationError> {
        postcard::to_slice(self, buffer)
            .map_err(|_| SerializationError::BufferTooSmall)
            .map(|slice| slice.len())
    }

    fn deserialize_from(
        buffer: &'a [u8],
    ) -> Result<(Self, usize), SerializationError> {
        postcard::from_bytes(buffer)
            .map(|v| (v, buffer.len()))
            .map_err(|_| SerializationError::InvalidFormat)
    }
}
