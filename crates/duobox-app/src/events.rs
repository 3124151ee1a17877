use crate::input::Button;
use core::fmt::Write;
use core::str::FromStr;
use derive_more::From;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Length of a peer address in `xx:xx:xx:xx:xx:xx` form.
pub const PEER_ADDRESS_LEN: usize = 17;

pub type PeerText = heapless::String<PEER_ADDRESS_LEN>;

/// Bluetooth device address of the last connected phone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerAddress(pub [u8; 6]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidPeerAddress;

impl PeerAddress {
    pub fn to_text(&self) -> PeerText {
        let mut text = PeerText::new();
        // 17 bytes always fit.
        let _ = write!(text, "{}", self);
        text
    }
}

impl FromStr for PeerAddress {
    type Err = InvalidPeerAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != PEER_ADDRESS_LEN {
            return Err(InvalidPeerAddress);
        }
        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            let at = i * 3;
            if i > 0 && bytes[at - 1] != b':' {
                return Err(InvalidPeerAddress);
            }
            let hi = hex_digit(bytes[at]).ok_or(InvalidPeerAddress)?;
            let lo = hex_digit(bytes[at + 1]).ok_or(InvalidPeerAddress)?;
            *octet = hi << 4 | lo;
        }
        Ok(Self(octets))
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

impl core::fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Connection state changes reported by the Bluetooth stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    Connected(PeerAddress),
    Disconnected,
}

const LINK_QUEUE_DEPTH: usize = 4;

/// Queue between the Bluetooth stack's callback context and the main loop.
///
/// The callback side only ever enqueues; persistence and mode changes happen
/// when the loop drains the queue.
pub struct LinkEvents(Channel<CriticalSectionRawMutex, LinkEvent, LINK_QUEUE_DEPTH>);

impl LinkEvents {
    pub const fn new() -> Self {
        Self(Channel::new())
    }

    /// Never blocks. Events are dropped when the loop has fallen behind.
    pub fn notify(&self, event: LinkEvent) {
        if self.0.try_send(event).is_err() {
            warn!("link event queue full, dropping {:?}", event);
        }
    }

    pub fn connected(&self, peer: PeerAddress) {
        self.notify(LinkEvent::Connected(peer));
    }

    pub fn disconnected(&self) {
        self.notify(LinkEvent::Disconnected);
    }

    pub(crate) fn try_next(&self) -> Option<LinkEvent> {
        self.0.try_receive().ok()
    }
}

impl Default for LinkEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the main loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, From)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Link(LinkEvent),
    /// Encoder ticks since the previous poll.
    Encoder(i32),
    /// The stable button value changed to a pressed key.
    Button(Button),
}
