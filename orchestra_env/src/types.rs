//! Common types shared between the protocol and its transport.

use serde::{Deserialize, Serialize};

/// Unique identifier for a musician node.
///
/// Ids are roster indices: stable for the process lifetime, assigned in
/// positions-file order. The conductor itself occupies a reserved id that no
/// roster can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MusicianId(pub u32);

impl MusicianId {
    /// Reserved id used by the conductor when it addresses musicians
    /// (the `start` signal). Rosters are indexed from zero and never
    /// reach this value.
    pub const CONDUCTOR: MusicianId = MusicianId(u32::MAX);

    /// Creates an id from a roster index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the raw id value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for MusicianId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::CONDUCTOR {
            write!(f, "conductor")
        } else {
            write!(f, "m{}", self.0)
        }
    }
}

/// Addressed wrapper for everything that crosses the transport.
///
/// The body is opaque to the transport: routing only looks at `sender` and
/// `receivers`. Each receiver gets an independent delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<B> {
    /// Originating node.
    pub sender: MusicianId,

    /// Destination nodes. Delivery to one must not block or fail delivery
    /// to another.
    pub receivers: Vec<MusicianId>,

    /// The payload, discriminated by the protocol layer.
    pub body: B,
}

impl<B> Envelope<B> {
    /// Creates an envelope addressed to a set of receivers.
    pub fn new(sender: MusicianId, receivers: Vec<MusicianId>, body: B) -> Self {
        Self {
            sender,
            receivers,
            body,
        }
    }

    /// Creates an envelope addressed to a single receiver.
    pub fn to_one(sender: MusicianId, receiver: MusicianId, body: B) -> Self {
        Self::new(sender, vec![receiver], body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        assert_eq!(MusicianId::from_index(7).to_string(), "m7");
        assert_eq!(MusicianId::CONDUCTOR.to_string(), "conductor");
    }

    #[test]
    fn test_conductor_id_out_of_roster_range() {
        // Roster ids are sequential indices; even an absurd roster stays
        // below the reserved id.
        assert!(MusicianId::from_index(1_000_000) < MusicianId::CONDUCTOR);
    }
}
