use crate::board::{BluetoothSink, Board, Network, Peripherals, System};
use crate::chain::SignalChain;
use crate::config::{station, Config, Url, BT_VOLUME_MAX};
use crate::events::{Event, LinkEvent, LinkEvents};
use crate::input::{Button, Inputs};
use crate::mode::{Mode, ModeRequest};
use crate::storage::SettingsStore;
use crate::volume::VolumeControl;
use embedded_hal_async::delay::DelayNs;

/// Controller state, built once by [`AppContext::boot`] and driven by
/// [`AppContext::run_once`] until the next restart.
pub struct AppContext<B: Board> {
    pub(crate) config: Config,
    pub(crate) mode: Mode,
    pub(crate) settings: B::Store,
    pub(crate) volume: VolumeControl<B::Amplifier>,
    pub(crate) chain: SignalChain<B::Stream, B::Output>,
    pub(crate) bluetooth: B::Bluetooth,
    pub(crate) network: B::Network,
    pub(crate) inputs: Inputs<B::Button, B::Encoder>,
    pub(crate) system: B::System,
    pub(crate) delay: B::Delay,
    pub(crate) links: &'static LinkEvents,
    /// Station the running (or next) stream plays.
    pub(crate) current_url: Url,
    pub(crate) bass_boost: bool,
    pub(crate) last_button: Button,
    /// A phone connected while not in Bluetooth mode.
    pub(crate) switch_requested: bool,
    /// Restart issued; the loop must not touch anything anymore.
    pub(crate) restarting: bool,
}

impl<B: Board> AppContext<B> {
    /// Load the stored mode and run that mode's init path.
    pub async fn boot(
        peripherals: Peripherals<B>,
        links: &'static LinkEvents,
        config: Config,
    ) -> Self {
        let Peripherals {
            output,
            amplifier,
            stream,
            bluetooth,
            network,
            mut store,
            button,
            encoder,
            system,
            delay,
        } = peripherals;

        let mode = store.mode().await;
        info!("booting in {:?}", mode);

        let mut app = Self {
            config,
            mode,
            settings: store,
            volume: VolumeControl::new(amplifier),
            chain: SignalChain::new(
                stream,
                output,
                config.bass_gain_db,
                config.bass_cutoff_hz,
                config.stream_buffer_size,
            ),
            bluetooth,
            network,
            inputs: Inputs::new(button, encoder, config.debounce_ms, system.now_ms()),
            system,
            delay,
            links,
            current_url: station(0).unwrap_or_default(),
            bass_boost: false,
            last_button: Button::None,
            switch_requested: false,
            restarting: false,
        };

        match mode {
            Mode::Bluetooth => app.boot_bluetooth().await,
            Mode::Radio => app.boot_radio().await,
            Mode::Idle => app.boot_idle(),
        }
        app
    }

    async fn boot_bluetooth(&mut self) {
        self.bluetooth.set_output_active(true);
        self.bluetooth.listen(self.links);
        // Amplifier after the sink has configured I2S.
        let _ = self.volume.init(&mut self.settings).await;
        self.inputs.init_encoder();
        if self.bluetooth.start(self.config.device_name).is_err() {
            error!("Bluetooth sink failed to start");
        }
        info!("Bluetooth ready, waiting for a phone");

        self.delay.delay_ms(self.config.bluetooth_settle_ms).await;
        // The phone controls the volume from here on.
        let _ = self.volume.set_temporary(self.config.bluetooth_amp_percent);

        match self.settings.peer_address().await {
            Some(peer) => {
                if self.bluetooth.connect_to(&peer) {
                    info!("autoconnect to {} started", peer.to_text().as_str());
                } else {
                    warn!("autoconnect to {} failed", peer.to_text().as_str());
                }
            }
            None => info!("no stored peer, waiting for a phone"),
        }
    }

    async fn boot_radio(&mut self) {
        let _ = self.chain.begin_output();
        self.current_url = self.settings.radio_url().await;

        let _ = self.volume.init(&mut self.settings).await;
        self.inputs.init_encoder();

        if self.network.connect() {
            info!("network connected");
            if let Err(e) = self
                .chain
                .start_radio(&self.network, &mut self.settings, self.bass_boost)
                .await
            {
                warn!("stream not started: {:?}", e);
            }
        } else {
            warn!("network connection failed, radio not started");
        }

        info!("Bluetooth listening in the background");
        self.start_listening();
    }

    fn boot_idle(&mut self) {
        info!("idle: Bluetooth listening only");
        self.inputs.init_encoder();
        self.start_listening();
    }

    fn start_listening(&mut self) {
        self.bluetooth.listen(self.links);
        self.bluetooth.set_output_active(false);
        if self.bluetooth.start(self.config.device_name).is_err() {
            error!("Bluetooth sink failed to start");
        }
    }

    /// One pass of the main loop. Does nothing once a restart was issued.
    pub async fn run_once(&mut self) {
        if self.restarting {
            return;
        }

        while let Some(event) = self.links.try_next() {
            self.handle_event(event.into()).await;
        }
        if self.switch_requested {
            self.switch_requested = false;
            self.change_mode(ModeRequest::Bluetooth).await;
            if self.restarting {
                return;
            }
        }

        if self.mode == Mode::Radio {
            self.service_stream().await;
        }

        let delta = self.inputs.poll_encoder();
        if delta != 0 {
            self.handle_event(Event::Encoder(delta)).await;
        }

        let button = self.inputs.poll_button(self.system.now_ms());
        if button != self.last_button && button != Button::None {
            self.handle_event(Event::Button(button)).await;
        }
        self.last_button = button;
        if self.restarting {
            return;
        }

        self.delay.delay_ms(self.config.loop_yield_ms).await;
    }

    /// Loop forever. Returns only by way of a device restart.
    pub async fn run(mut self) -> ! {
        loop {
            self.run_once().await;
        }
    }

    pub async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Link(LinkEvent::Connected(peer)) => {
                info!("phone {} connected", peer.to_text().as_str());
                let _ = self.settings.set_peer_address(&peer).await;
                if self.mode != Mode::Bluetooth {
                    info!("connection outside Bluetooth mode, switching");
                    self.switch_requested = true;
                }
            }
            Event::Link(LinkEvent::Disconnected) => info!("phone disconnected"),
            Event::Encoder(delta) => self.apply_encoder(delta).await,
            Event::Button(button) => {
                let request = match button {
                    Button::None => return,
                    Button::Key1 => ModeRequest::Idle,
                    Button::Key2 => ModeRequest::Radio(station(1).unwrap_or_default()),
                    Button::Key3 => ModeRequest::Radio(station(2).unwrap_or_default()),
                };
                self.change_mode(request).await;
            }
        }
    }

    async fn apply_encoder(&mut self, delta: i32) {
        match self.mode {
            Mode::Radio => {
                if let Err(e) = self.volume.adjust(delta, &mut self.settings).await {
                    warn!("volume change incomplete: {:?}", e);
                }
            }
            Mode::Bluetooth => {
                let current = self.bluetooth.volume() as i32;
                let target = current.saturating_add(delta).clamp(0, BT_VOLUME_MAX as i32);
                self.bluetooth.set_volume(target as u8);
                info!("Bluetooth volume {}", self.bluetooth.volume());
            }
            Mode::Idle => {}
        }
    }

    /// Keep the stream alive: pump it, or rebuild it after a short delay.
    async fn service_stream(&mut self) {
        if self.chain.is_running() {
            if !self.chain.pump() {
                info!("stream ended or interrupted");
                self.chain.stop_radio();
            }
        } else if self.network.is_connected() {
            info!("stream not running, restarting it");
            self.delay.delay_ms(self.config.stream_retry_ms).await;
            if let Err(e) = self
                .chain
                .start_radio(&self.network, &mut self.settings, self.bass_boost)
                .await
            {
                warn!("stream not started: {:?}", e);
            }
        } else {
            info!("waiting for network");
            self.delay.delay_ms(self.config.stream_retry_ms).await;
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn bass_boost(&self) -> bool {
        self.bass_boost
    }

    pub fn switch_requested(&self) -> bool {
        self.switch_requested
    }

    pub fn is_restarting(&self) -> bool {
        self.restarting
    }

    pub fn settings(&self) -> &B::Store {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut B::Store {
        &mut self.settings
    }

    pub fn volume(&self) -> &VolumeControl<B::Amplifier> {
        &self.volume
    }

    pub fn chain(&self) -> &SignalChain<B::Stream, B::Output> {
        &self.chain
    }

    pub fn bluetooth(&self) -> &B::Bluetooth {
        &self.bluetooth
    }

    pub fn network(&self) -> &B::Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut B::Network {
        &mut self.network
    }

    pub fn system(&self) -> &B::System {
        &self.system
    }
}
