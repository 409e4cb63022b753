//! Wire messages of the election protocol.
//!
//! A single tagged enum with a common envelope (see
//! [`orchestra_env::Envelope`]) replaces the original's base-class/derived
//! message hierarchy; handlers dispatch by matching on the variant.

use serde::{Deserialize, Serialize};

/// Role of an Exchange message in the request/reply pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeStatus {
    /// "Here is my priority value - do you defer to me?"
    Requested,
    /// "Yes, your value beats mine (or I am a resolved loser)."
    Accepted,
    /// "No, I do not defer."
    Rejected,
}

/// Outcome claimed by a Prioritize message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityStatus {
    /// The sender confirmed itself as the unique local maximum.
    Winner,
    /// The sender concedes it is not (yet) a winner this round.
    NotWinner,
}

/// Every message that crosses the stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Musician -> conductor: register with the join barrier.
    Join,

    /// Conductor -> musician: the barrier closed, begin the first round.
    /// Zero payload; duplicates after the first are ignored.
    Start,

    /// Priority comparison. A request carries the sender's own priority
    /// value; a reply echoes the requester's original value (informational
    /// only - the reply's meaning is in its status).
    Exchange { value: u64, status: ExchangeStatus },

    /// Winner announcement / loser concession.
    Prioritize { status: PriorityStatus },

    /// Performance heartbeat from the current winner. Resets the lease
    /// deadline of every listening loser.
    Perform,

    /// Diagnostic reply to an out-of-phase message. Logged by the receiver,
    /// otherwise inert.
    Reject { reason: String },
}

impl Message {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Join => "join",
            Message::Start => "start",
            Message::Exchange { .. } => "exchange",
            Message::Prioritize { .. } => "prioritize",
            Message::Perform => "perform",
            Message::Reject { .. } => "reject",
        }
    }
}
