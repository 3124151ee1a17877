#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use duobox_app::board::{
    Amplifier, BluetoothSink, Board, ButtonLadder, Decoder, Network,
    Peripherals, PulseCounter, StreamBackend, System,
};
use duobox_app::config::{station, Url};
use duobox_app::storage::{SettingsStore, StorageData, StorageKey};
use duobox_app::{AppContext, AudioSink, Config, Frame, LinkEvents, PeerAddress};
use embedded_hal_async::delay::DelayNs;
use embedded_storage_async::nor_flash::{
    ErrorType, MultiwriteNorFlash, NorFlash, NorFlashErrorKind, ReadNorFlash,
};

// ---------------------------------------------------------------------------
// Shared simulation state
// ---------------------------------------------------------------------------

/// Everything the mocks did, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    OutputBegin,
    AmpInit,
    AmpVolume(u8),
    Open(String),
    Buffer(usize),
    DecoderBegin,
    DecoderStop,
    DecoderDropped,
    BufferDropped,
    SourceDropped,
    BtListen,
    BtOutputActive(bool),
    BtStart(String),
    BtConnect(String),
    BtVolume(u8),
    NetConnect,
    NetDisable,
    EncoderInit,
    Save(StorageData),
    Delay(u32),
    Restart,
}

pub struct State {
    pub ops: Vec<Op>,
    pub now_ms: u64,

    pub store: BTreeMap<u16, StorageData>,
    pub store_fails: bool,

    pub amp_init_fails: bool,
    pub net_joins: bool,
    pub net_connected: bool,
    pub open_fails: bool,
    pub decoder_begins: bool,
    /// Frames left before the stream ends. `None` plays forever.
    pub stream_frames: Option<usize>,
    pub frames: Vec<Frame>,
    /// Frames the output refuses before accepting again.
    pub output_rejects: usize,

    pub bt_volume: u8,
    pub bt_connect_ok: bool,

    pub button_raw: u16,
    /// Journal length at the last button read.
    pub button_read_at: Option<usize>,
    pub encoder_count: i64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            ops: Vec::new(),
            now_ms: 0,
            store: BTreeMap::new(),
            store_fails: false,
            amp_init_fails: false,
            net_joins: true,
            net_connected: false,
            open_fails: false,
            decoder_begins: true,
            stream_frames: None,
            frames: Vec::new(),
            output_rejects: 0,
            bt_volume: 64,
            bt_connect_ok: true,
            button_raw: 4095,
            button_read_at: None,
            encoder_count: 0,
        }
    }
}

#[derive(Clone, Default)]
pub struct Sim(Rc<RefCell<State>>);

impl Sim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    fn record(&self, op: Op) {
        self.0.borrow_mut().ops.push(op);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.0.borrow().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.0.borrow_mut().ops.clear();
    }

    pub fn count(&self, op: &Op) -> usize {
        self.0.borrow().ops.iter().filter(|o| *o == op).count()
    }

    pub fn saw(&self, op: &Op) -> bool {
        self.count(op) > 0
    }

    pub fn stored(&self, key: StorageKey) -> Option<StorageData> {
        self.0.borrow().store.get(&u16::from(key)).cloned()
    }

    pub fn preset(&self, data: StorageData) {
        self.0.borrow_mut().store.insert(data.key().into(), data);
    }

    /// Asserts that `expected` appear in the journal in this order, with
    /// anything in between.
    #[track_caller]
    pub fn assert_sequence(&self, expected: &[Op]) {
        let ops = self.ops();
        let mut rest = ops.iter();
        for op in expected {
            assert!(
                rest.any(|o| o == op),
                "{op:?} missing or out of order in {ops:?}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

pub struct MockOutput(pub Sim);

impl AudioSink for MockOutput {
    type Error = ();

    fn begin(&mut self) -> Result<(), ()> {
        self.0.record(Op::OutputBegin);
        Ok(())
    }

    fn consume_frame(&mut self, frame: Frame) -> bool {
        self.0.with(|s| {
            if s.output_rejects > 0 {
                s.output_rejects -= 1;
                return false;
            }
            s.frames.push(frame);
            true
        })
    }
}

pub struct MockAmp(pub Sim);

impl Amplifier for MockAmp {
    type Error = ();

    fn init(&mut self) -> Result<(), ()> {
        self.0.record(Op::AmpInit);
        if self.0.with(|s| s.amp_init_fails) {
            Err(())
        } else {
            Ok(())
        }
    }

    fn set_volume(&mut self, driver_units: u8) -> Result<(), ()> {
        self.0.record(Op::AmpVolume(driver_units));
        Ok(())
    }
}

pub struct MockSource(Sim);

impl Drop for MockSource {
    fn drop(&mut self) {
        self.0.record(Op::SourceDropped);
    }
}

pub struct MockBuffer {
    sim: Sim,
    _source: MockSource,
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.sim.record(Op::BufferDropped);
    }
}

pub struct MockDecoder {
    sim: Sim,
    running: bool,
}

/// Sample the mock decoder produces on every step.
pub const DECODED: Frame = Frame::new(1000, -1000);

impl Decoder for MockDecoder {
    type Input = MockBuffer;

    fn begin<S: AudioSink>(&mut self, _input: &mut MockBuffer, sink: &mut S) -> bool {
        self.sim.record(Op::DecoderBegin);
        if !self.sim.with(|s| s.decoder_begins) || sink.begin().is_err() {
            return false;
        }
        self.running = true;
        true
    }

    fn step<S: AudioSink>(&mut self, _input: &mut MockBuffer, sink: &mut S) -> bool {
        let more = self.sim.with(|s| match &mut s.stream_frames {
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
            None => true,
        });
        if !more {
            self.running = false;
            return false;
        }
        while !sink.consume_frame(DECODED) {}
        true
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn stop(&mut self) {
        self.sim.record(Op::DecoderStop);
        self.running = false;
    }
}

impl Drop for MockDecoder {
    fn drop(&mut self) {
        self.sim.record(Op::DecoderDropped);
    }
}

pub struct MockStream(pub Sim);

impl StreamBackend for MockStream {
    type Error = ();
    type Source = MockSource;
    type Buffer = MockBuffer;
    type Decoder = MockDecoder;

    fn open(&mut self, url: &str) -> Result<MockSource, ()> {
        self.0.record(Op::Open(url.into()));
        if self.0.with(|s| s.open_fails) {
            Err(())
        } else {
            Ok(MockSource(self.0.clone()))
        }
    }

    fn buffer(&mut self, source: MockSource, capacity: usize) -> Result<MockBuffer, ()> {
        self.0.record(Op::Buffer(capacity));
        Ok(MockBuffer { sim: self.0.clone(), _source: source })
    }

    fn decoder(&mut self) -> MockDecoder {
        MockDecoder { sim: self.0.clone(), running: false }
    }
}

pub struct MockBluetooth(pub Sim);

impl BluetoothSink for MockBluetooth {
    type Error = ();

    fn listen(&mut self, _events: &'static LinkEvents) {
        self.0.record(Op::BtListen);
    }

    fn set_output_active(&mut self, active: bool) {
        self.0.record(Op::BtOutputActive(active));
    }

    fn start(&mut self, device_name: &str) -> Result<(), ()> {
        self.0.record(Op::BtStart(device_name.into()));
        Ok(())
    }

    fn connect_to(&mut self, peer: &PeerAddress) -> bool {
        self.0.record(Op::BtConnect(peer.to_text().as_str().into()));
        self.0.with(|s| s.bt_connect_ok)
    }

    fn volume(&self) -> u8 {
        self.0.with(|s| s.bt_volume)
    }

    fn set_volume(&mut self, volume: u8) {
        self.0.record(Op::BtVolume(volume));
        self.0.with(|s| s.bt_volume = volume);
    }
}

pub struct MockNetwork(pub Sim);

impl Network for MockNetwork {
    fn connect(&mut self) -> bool {
        self.0.record(Op::NetConnect);
        self.0.with(|s| {
            s.net_connected = s.net_joins;
            s.net_connected
        })
    }

    fn is_connected(&self) -> bool {
        self.0.with(|s| s.net_connected)
    }

    fn disable(&mut self) {
        self.0.record(Op::NetDisable);
        self.0.with(|s| s.net_connected = false);
    }
}

#[derive(Debug, PartialEq)]
pub struct StoreError;

pub struct MemoryStore(pub Sim);

impl SettingsStore for MemoryStore {
    type Error = StoreError;

    async fn load(&mut self, key: StorageKey) -> Result<Option<StorageData>, StoreError> {
        Ok(self.0.stored(key))
    }

    async fn save(&mut self, data: &StorageData) -> Result<(), StoreError> {
        if self.0.with(|s| s.store_fails) {
            return Err(StoreError);
        }
        self.0.record(Op::Save(data.clone()));
        self.0.preset(data.clone());
        Ok(())
    }
}

pub struct MockButton(pub Sim);

impl ButtonLadder for MockButton {
    fn read_raw(&mut self) -> u16 {
        self.0.with(|s| {
            s.button_read_at = Some(s.ops.len());
            s.button_raw
        })
    }
}

pub struct MockEncoder(pub Sim);

impl PulseCounter for MockEncoder {
    fn init(&mut self) {
        self.0.record(Op::EncoderInit);
    }

    fn count(&mut self) -> i64 {
        self.0.with(|s| s.encoder_count)
    }

    fn clear(&mut self) {
        self.0.with(|s| s.encoder_count = 0);
    }
}

pub struct MockSystem(pub Sim);

impl System for MockSystem {
    fn now_ms(&self) -> u64 {
        self.0.with(|s| s.now_ms)
    }

    fn restart(&mut self) {
        self.0.record(Op::Restart);
    }
}

/// Delays complete at once and advance the simulated clock.
pub struct MockDelay(pub Sim);

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.with(|s| s.now_ms += (ns / 1_000_000) as u64);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.0.record(Op::Delay(ms));
        self.0.with(|s| s.now_ms += ms as u64);
    }
}

pub struct MockBoard;

impl Board for MockBoard {
    type Output = MockOutput;
    type Amplifier = MockAmp;
    type Stream = MockStream;
    type Bluetooth = MockBluetooth;
    type Network = MockNetwork;
    type Store = MemoryStore;
    type Button = MockButton;
    type Encoder = MockEncoder;
    type System = MockSystem;
    type Delay = MockDelay;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn peripherals(sim: &Sim) -> Peripherals<MockBoard> {
    Peripherals {
        output: MockOutput(sim.clone()),
        amplifier: MockAmp(sim.clone()),
        stream: MockStream(sim.clone()),
        bluetooth: MockBluetooth(sim.clone()),
        network: MockNetwork(sim.clone()),
        store: MemoryStore(sim.clone()),
        button: MockButton(sim.clone()),
        encoder: MockEncoder(sim.clone()),
        system: MockSystem(sim.clone()),
        delay: MockDelay(sim.clone()),
    }
}

pub fn links() -> &'static LinkEvents {
    Box::leak(Box::new(LinkEvents::new()))
}

pub async fn boot(sim: &Sim) -> (AppContext<MockBoard>, &'static LinkEvents) {
    let links = links();
    let app = AppContext::boot(peripherals(sim), links, Config::default()).await;
    (app, links)
}

pub fn url(index: usize) -> Url {
    station(index).unwrap()
}

pub fn url_string(index: usize) -> String {
    url(index).as_str().to_string()
}

/// Raw ladder readings for each key.
pub const RAW_KEY1: u16 = 50;
pub const RAW_KEY2: u16 = 400;
pub const RAW_KEY3: u16 = 800;
pub const RAW_NONE: u16 = 4095;

// ---------------------------------------------------------------------------
// RAM-backed NOR flash
// ---------------------------------------------------------------------------

pub const FLASH_PAGE: usize = 4096;

/// Cloning shares the memory, so a second store can reopen it.
#[derive(Clone)]
pub struct RamFlash {
    mem: Rc<RefCell<Vec<u8>>>,
}

impl RamFlash {
    pub fn new(pages: usize) -> Self {
        Self { mem: Rc::new(RefCell::new(vec![0xff; pages * FLASH_PAGE])) }
    }
}

impl ErrorType for RamFlash {
    type Error = NorFlashErrorKind;
}

impl ReadNorFlash for RamFlash {
    const READ_SIZE: usize = 1;

    async fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let mem = self.mem.borrow();
        let start = offset as usize;
        let end = start + bytes.len();
        if end > mem.len() {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        bytes.copy_from_slice(&mem[start..end]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.mem.borrow().len()
    }
}

impl NorFlash for RamFlash {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = FLASH_PAGE;

    async fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let (from, to) = (from as usize, to as usize);
        if from % FLASH_PAGE != 0 || to % FLASH_PAGE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        let mut mem = self.mem.borrow_mut();
        if to > mem.len() || from > to {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        mem[from..to].fill(0xff);
        Ok(())
    }

    async fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        if start % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        let mut mem = self.mem.borrow_mut();
        let end = start + bytes.len();
        if end > mem.len() {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        // Programming can only clear bits.
        for (cell, b) in mem[start..end].iter_mut().zip(bytes) {
            *cell &= *b;
        }
        Ok(())
    }
}

impl MultiwriteNorFlash for RamFlash {}
