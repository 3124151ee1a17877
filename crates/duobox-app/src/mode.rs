//! Radio / Bluetooth / Idle state machine.
//!
//! Changes that keep the mode (retune, bass boost toggle) rebuild only the
//! playback pipeline. Anything else persists the target and restarts the
//! device, so each mode's drivers are only ever set up by the boot path.

use crate::app::AppContext;
use crate::board::{BluetoothSink, Board, Network, System};
use crate::config::Url;
use crate::storage::SettingsStore;

/// Active audio source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    #[default]
    Radio = 0,
    Bluetooth = 1,
    Idle = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeError {
    InvalidConversion(u32),
}

impl From<Mode> for u32 {
    fn from(mode: Mode) -> u32 {
        mode as u32
    }
}

impl TryFrom<u32> for Mode {
    type Error = ModeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Radio),
            1 => Ok(Mode::Bluetooth),
            2 => Ok(Mode::Idle),
            _ => Err(ModeError::InvalidConversion(value)),
        }
    }
}

/// What the user or the Bluetooth stack asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeRequest {
    Radio(Url),
    Bluetooth,
    Idle,
}

/// How a request is carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Plan {
    EnterIdle,
    /// Same station requested again.
    ToggleBassBoost,
    Retune(Url),
    Restart { mode: Mode, url: Option<Url> },
}

pub fn plan(current: Mode, current_url: &str, request: &ModeRequest) -> Plan {
    match (current, request) {
        (_, ModeRequest::Idle) => Plan::EnterIdle,
        (Mode::Radio, ModeRequest::Radio(url)) if url.as_str() == current_url => {
            Plan::ToggleBassBoost
        }
        (Mode::Radio, ModeRequest::Radio(url)) => Plan::Retune(url.clone()),
        (_, ModeRequest::Radio(url)) => {
            Plan::Restart { mode: Mode::Radio, url: Some(url.clone()) }
        }
        (_, ModeRequest::Bluetooth) => {
            Plan::Restart { mode: Mode::Bluetooth, url: None }
        }
    }
}

/// Outcome of [`AppContext::change_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// Handled in place; the device is now in this mode.
    Soft(Mode),
    /// Intent persisted and restart issued.
    Restarting(Mode),
    /// Persisting failed; nothing changed.
    Aborted,
}

impl<B: Board> AppContext<B> {
    pub async fn change_mode(&mut self, request: ModeRequest) -> Transition {
        let plan = plan(self.mode, &self.current_url, &request);
        debug!("{:?} in {:?}: {:?}", request, self.mode, plan);
        match plan {
            Plan::EnterIdle => self.enter_idle().await,
            Plan::ToggleBassBoost => self.toggle_bass_boost().await,
            Plan::Retune(url) => self.retune(url).await,
            Plan::Restart { mode, url } => self.restart_into(mode, url).await,
        }
    }

    async fn enter_idle(&mut self) -> Transition {
        info!("entering idle: network off, Bluetooth listening");
        if self.settings.set_mode(Mode::Idle).await.is_err() {
            warn!("idle mode not persisted, entering it anyway");
        }
        self.network.disable();
        self.chain.stop_radio();
        self.bluetooth.set_output_active(false);
        if self.bluetooth.start(self.config.device_name).is_err() {
            error!("Bluetooth sink failed to start");
        }
        self.mode = Mode::Idle;
        Transition::Soft(Mode::Idle)
    }

    async fn toggle_bass_boost(&mut self) -> Transition {
        self.bass_boost = !self.bass_boost;
        info!("same station, bass boost {}", self.bass_boost);
        self.restart_stream().await;
        Transition::Soft(Mode::Radio)
    }

    async fn retune(&mut self, url: Url) -> Transition {
        info!("retuning to {}", url.as_str());
        if self.settings.set_radio_url(&url).await.is_err() {
            return Transition::Aborted;
        }
        self.current_url = url;
        self.restart_stream().await;
        Transition::Soft(Mode::Radio)
    }

    /// Persist, then restart. A failed write leaves the device as it was.
    async fn restart_into(&mut self, mode: Mode, url: Option<Url>) -> Transition {
        info!("switching to {:?} via restart", mode);
        if let Some(url) = &url {
            if self.settings.set_radio_url(url).await.is_err() {
                return Transition::Aborted;
            }
        }
        if self.settings.set_mode(mode).await.is_err() {
            return Transition::Aborted;
        }
        self.restarting = true;
        self.system.restart();
        Transition::Restarting(mode)
    }

    /// Rebuild the pipeline; failures are left to the loop's retry.
    async fn restart_stream(&mut self) {
        if let Err(e) = self
            .chain
            .start_radio(&self.network, &mut self.settings, self.bass_boost)
            .await
        {
            warn!("stream not started: {:?}", e);
        }
    }
}
