//! Builds and tears down the radio playback graph
//! `source -> buffer -> decoder -> [bass boost] -> output`.

use crate::board::{Decoder, Network, StreamBackend};
use crate::storage::SettingsStore;
use crate::Error;
use bass_boost::{AudioSink, BassBoost, Frame};

/// Where the decoder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Route {
    /// Straight into the output.
    Direct,
    /// Through the bass boost stage.
    BassBoost,
}

/// The stage and the output behind it, seen as one sink whose entry point
/// depends on the route.
struct RoutedSink<'a, O> {
    stage: &'a mut BassBoost<O>,
    route: Route,
}

impl<O: AudioSink> AudioSink for RoutedSink<'_, O> {
    type Error = O::Error;

    fn begin(&mut self) -> Result<(), Self::Error> {
        match self.route {
            Route::Direct => self.stage.output_mut().begin(),
            Route::BassBoost => self.stage.begin(),
        }
    }

    fn consume_frame(&mut self, frame: Frame) -> bool {
        match self.route {
            Route::Direct => self.stage.output_mut().consume_frame(frame),
            Route::BassBoost => self.stage.consume_frame(frame),
        }
    }
}

struct Pipeline<S: StreamBackend> {
    decoder: S::Decoder,
    /// Owns the network source.
    buffer: S::Buffer,
    route: Route,
}

impl<S: StreamBackend> Pipeline<S> {
    /// Stop the decoder, then release the buffer and its source.
    fn release(mut self) {
        self.decoder.stop();
        let Self { decoder, buffer, .. } = self;
        drop(decoder);
        drop(buffer);
    }
}

/// Owner of the output path. At most one pipeline exists at a time.
pub struct SignalChain<S: StreamBackend, O> {
    backend: S,
    stage: BassBoost<O>,
    pipeline: Option<Pipeline<S>>,
    buffer_size: usize,
}

impl<S: StreamBackend, O: AudioSink> SignalChain<S, O> {
    pub fn new(
        backend: S,
        output: O,
        gain_db: f32,
        cutoff_hz: f32,
        buffer_size: usize,
    ) -> Self {
        Self {
            backend,
            stage: BassBoost::new(output, gain_db, cutoff_hz),
            pipeline: None,
            buffer_size,
        }
    }

    /// Start the raw output. Needed once in radio mode before any stream.
    pub fn begin_output(&mut self) -> Result<(), Error> {
        self.stage.output_mut().begin().map_err(|_| {
            error!("audio output failed to start");
            Error::OutputInit
        })
    }

    /// A pipeline exists.
    pub fn is_active(&self) -> bool {
        self.pipeline.is_some()
    }

    /// A pipeline exists and its decoder is running.
    pub fn is_running(&self) -> bool {
        self.pipeline
            .as_ref()
            .is_some_and(|p| p.decoder.is_running())
    }

    pub fn route(&self) -> Option<Route> {
        self.pipeline.as_ref().map(|p| p.route)
    }

    pub fn stage(&self) -> &BassBoost<O> {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut BassBoost<O> {
        &mut self.stage
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Tear the pipeline down. No-op when nothing is running.
    pub fn stop_radio(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            info!("stopping stream");
            pipeline.release();
            self.stage.discard_pending();
        }
    }

    /// Run the decoder one step. `false` means the stream ended or failed,
    /// or there is no pipeline.
    pub fn pump(&mut self) -> bool {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return false;
        };
        let mut sink = RoutedSink { stage: &mut self.stage, route: pipeline.route };
        pipeline.decoder.step(&mut pipeline.buffer, &mut sink)
    }

    /// Replace any running pipeline with a fresh one for the stored URL.
    ///
    /// On failure nothing of the new pipeline is left behind.
    pub async fn start_radio<N: Network, St: SettingsStore>(
        &mut self,
        network: &N,
        settings: &mut St,
        bass_boost: bool,
    ) -> Result<(), Error> {
        self.stop_radio();

        if !network.is_connected() {
            warn!("network not connected, stream not started");
            return Err(Error::NoNetwork);
        }

        let url = settings.radio_url().await;
        info!("starting stream {}", url.as_str());

        let source = self.backend.open(&url).map_err(|_| {
            error!("failed to open {}", url.as_str());
            Error::StreamOpen
        })?;
        let buffer =
            self.backend.buffer(source, self.buffer_size).map_err(|_| {
                error!("failed to allocate stream buffer");
                Error::StreamOpen
            })?;
        let decoder = self.backend.decoder();

        let route = if bass_boost { Route::BassBoost } else { Route::Direct };
        let pipeline =
            self.pipeline.insert(Pipeline { decoder, buffer, route });
        let mut sink = RoutedSink { stage: &mut self.stage, route };
        if !pipeline.decoder.begin(&mut pipeline.buffer, &mut sink) {
            error!("decoder failed to start");
            self.stop_radio();
            return Err(Error::DecoderStart);
        }

        info!("stream running, route {:?}", route);
        Ok(())
    }
}
