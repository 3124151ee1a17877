use super::{SettingsStore, StorageData, StorageKey, NAMESPACE};
use core::ops::Range;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{MapConfig, MapStorage};
use sequential_storage::Error;

/// Settings kept in a `sequential-storage` map on NOR flash. `N` is the
/// scratch buffer size and must hold the largest serialized item.
pub struct FlashStore<Flash: NorFlash, const N: usize> {
    map: MapStorage<u16, Flash, NoCache>,
    buffer: [u8; N],
}

impl<Flash: NorFlash, const N: usize> FlashStore<Flash, N> {
    /// `range` is the flash region reserved for settings, in bytes from the
    /// start of `flash`, aligned to erase pages.
    pub fn new(flash: Flash, range: Range<u32>) -> Self {
        debug!("{} settings in flash {}..{}", NAMESPACE, range.start, range.end);
        let config = MapConfig::new(range);
        Self {
            map: MapStorage::new(flash, config, NoCache::new()),
            buffer: [0; N],
        }
    }
}

impl<Flash: NorFlash, const N: usize> SettingsStore for FlashStore<Flash, N> {
    type Error = Error<Flash::Error>;

    async fn load(
        &mut self,
        key: StorageKey,
    ) -> Result<Option<StorageData>, Self::Error> {
        let key: u16 = key.into();
        self.map.fetch_item(&mut self.buffer, &key).await
    }

    async fn save(&mut self, data: &StorageData) -> Result<(), Self::Error> {
        let key: u16 = data.key().into();
        self.map.store_item(&mut self.buffer, &key, data).await
    }
}
