pub mod data;
pub mod flash;
pub mod keys;

// Re-export commonly used items for convenience
pub use data::StorageData;
pub use flash::FlashStore;
pub use keys::{StorageKey, NAMESPACE};

use crate::config::{Url, STATIONS};
use crate::events::PeerAddress;
use crate::mode::Mode;
use crate::volume::{VOLUME_DEFAULT, VOLUME_MAX, VOLUME_MIN};
use crate::Error;
use core::fmt::Debug;

/// Typed key/value persistence for the `audio_config` namespace.
///
/// Implementors provide raw `load`/`save`. The provided accessors apply
/// defaults and validation so a missing or malformed value never reaches the
/// controller.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    type Error: Debug;

    async fn load(
        &mut self,
        key: StorageKey,
    ) -> Result<Option<StorageData>, Self::Error>;

    async fn save(&mut self, data: &StorageData) -> Result<(), Self::Error>;

    /// Stored mode, [`Mode::Radio`] if absent or corrupt.
    async fn mode(&mut self) -> Mode {
        match self.load(StorageKey::AudioMode).await {
            Ok(Some(StorageData::AudioMode(raw))) => {
                Mode::try_from(raw).unwrap_or_else(|_| {
                    warn!("stored mode {} invalid, using Radio", raw);
                    Mode::default()
                })
            }
            other => {
                report_missing(StorageKey::AudioMode, &other);
                Mode::default()
            }
        }
    }

    async fn set_mode(&mut self, mode: Mode) -> Result<(), Error> {
        persist(self, &StorageData::AudioMode(mode.into())).await
    }

    /// Stored stream URL, the first built-in station if absent or not an
    /// http(s) URL.
    async fn radio_url(&mut self) -> Url {
        match self.load(StorageKey::RadioUrl).await {
            Ok(Some(StorageData::RadioUrl(url))) if is_stream_url(&url) => url,
            other => {
                report_missing(StorageKey::RadioUrl, &other);
                fallback_url()
            }
        }
    }

    async fn set_radio_url(&mut self, url: &Url) -> Result<(), Error> {
        persist(self, &StorageData::RadioUrl(url.clone())).await
    }

    /// Stored volume clamped to the valid range, mid-scale if absent.
    async fn volume(&mut self) -> u8 {
        match self.load(StorageKey::AudioVolume).await {
            Ok(Some(StorageData::AudioVolume(raw))) => {
                raw.clamp(VOLUME_MIN as u32, VOLUME_MAX as u32) as u8
            }
            other => {
                report_missing(StorageKey::AudioVolume, &other);
                VOLUME_DEFAULT
            }
        }
    }

    async fn set_volume(&mut self, volume: u8) -> Result<(), Error> {
        persist(self, &StorageData::AudioVolume(volume as u32)).await
    }

    /// Last connected phone, `None` unless the stored text is a well-formed
    /// address.
    async fn peer_address(&mut self) -> Option<PeerAddress> {
        match self.load(StorageKey::LastPeerAddress).await {
            Ok(Some(StorageData::LastPeerAddress(text))) => {
                match text.parse() {
                    Ok(peer) => Some(peer),
                    Err(_) => {
                        if !text.is_empty() {
                            warn!("stored peer address malformed, ignoring");
                        }
                        None
                    }
                }
            }
            other => {
                report_missing(StorageKey::LastPeerAddress, &other);
                None
            }
        }
    }

    async fn set_peer_address(&mut self, peer: &PeerAddress) -> Result<(), Error> {
        persist(self, &StorageData::LastPeerAddress(peer.to_text())).await
    }
}

async fn persist<S: SettingsStore + ?Sized>(
    store: &mut S,
    data: &StorageData,
) -> Result<(), Error> {
    store.save(data).await.map_err(|_| {
        error!("failed to store {}", data.key().name());
        Error::Storage
    })
}

fn report_missing<E>(key: StorageKey, result: &Result<Option<StorageData>, E>) {
    match result {
        Ok(None) => debug!("{} not stored, using default", key.name()),
        Ok(Some(_)) => warn!("{} holds a foreign value, using default", key.name()),
        Err(_) => error!("failed to read {}, using default", key.name()),
    }
}

fn is_stream_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn fallback_url() -> Url {
    // The built-in stations are far shorter than the URL capacity.
    let mut url = Url::new();
    let _ = url.push_str(STATIONS[0]);
    url
}
