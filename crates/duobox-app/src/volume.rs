use crate::board::Amplifier;
use crate::storage::SettingsStore;
use crate::Error;

pub const VOLUME_MIN: u8 = 0;
pub const VOLUME_MAX: u8 = 254;
pub const VOLUME_DEFAULT: u8 = 127;

/// User volume in `VOLUME_MIN..=VOLUME_MAX` and its amplifier mirror.
///
/// The amplifier counts the other way, `driver = VOLUME_MAX - volume`.
pub struct VolumeControl<A> {
    amplifier: A,
    level: u8,
    online: bool,
}

/// Inverted amplifier scale for a user level.
pub const fn driver_value(level: u8) -> u8 {
    VOLUME_MAX - level
}

impl<A: Amplifier> VolumeControl<A> {
    pub fn new(amplifier: A) -> Self {
        Self { amplifier, level: VOLUME_DEFAULT, online: false }
    }

    /// Bring the amplifier up and restore the stored level.
    ///
    /// An amplifier that fails to init leaves the device running without
    /// audio output; the level is still loaded and tracked.
    pub async fn init<S: SettingsStore>(&mut self, settings: &mut S) -> Result<(), Error> {
        let result = match self.amplifier.init() {
            Ok(()) => {
                self.online = true;
                Ok(())
            }
            Err(_) => {
                error!("amplifier init failed, continuing without audio");
                self.online = false;
                Err(Error::AmplifierInit)
            }
        };
        self.level = settings.volume().await;
        info!("volume restored to {}", self.level);
        result.and(self.write_driver())
    }

    /// Set, write through and persist.
    pub async fn set<S: SettingsStore>(
        &mut self,
        level: i32,
        settings: &mut S,
    ) -> Result<(), Error> {
        self.level = level.clamp(VOLUME_MIN as i32, VOLUME_MAX as i32) as u8;
        let written = self.write_driver();
        settings.set_volume(self.level).await?;
        written
    }

    /// Every call is persisted, however fast the encoder turns.
    pub async fn adjust<S: SettingsStore>(
        &mut self,
        delta: i32,
        settings: &mut S,
    ) -> Result<(), Error> {
        let target = (self.level as i32).saturating_add(delta);
        self.set(target, settings).await
    }

    /// Force `percent` of the range without persisting it. Used while the
    /// phone owns the volume.
    pub fn set_temporary(&mut self, percent: u8) -> Result<(), Error> {
        let percent = percent.min(100) as u32;
        let span = (VOLUME_MAX - VOLUME_MIN) as u32;
        self.level = (VOLUME_MIN as u32 + percent * span / 100) as u8;
        self.write_driver()
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn driver_value(&self) -> u8 {
        driver_value(self.level)
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn amplifier(&self) -> &A {
        &self.amplifier
    }

    /// No-op while the amplifier is offline.
    fn write_driver(&mut self) -> Result<(), Error> {
        if !self.online {
            return Ok(());
        }
        self.amplifier.set_volume(self.driver_value()).map_err(|_| {
            warn!("amplifier rejected volume {}", self.level);
            Error::Amplifier
        })
    }
}
