//! Orchestra Environment Abstraction Layer
//!
//! This crate provides the contracts between the election protocol and the
//! "real world": how messages travel and how time passes. The protocol in
//! `orchestra_core` never touches a socket or a timer directly - it is driven
//! by whatever implements these traits.
//!
//! # Core Concept: Transport as a Collaborator
//!
//! The protocol only relies on one delivery contract: an envelope sent to a
//! set of musician ids is eventually delivered, in per-sender FIFO order, to
//! each alive musician in that set. Everything else (channels, sockets, a
//! broker process) lives behind [`Transport`].
//!
//! # Example
//!
//! ```ignore
//! use orchestra_env::{Clock, Transport};
//!
//! async fn agent_loop<T: Transport>(clock: &dyn Clock, transport: &T) {
//!     loop {
//!         tokio::select! {
//!             envelope = transport.recv() => handle(envelope),
//!             _ = clock.sleep(Duration::from_millis(500)) => tick(),
//!         }
//!     }
//! }
//! ```

mod clock;
mod error;
mod tokio_impl;
mod transport;
mod types;

pub use clock::Clock;
pub use error::EnvError;
pub use tokio_impl::TokioClock;
pub use transport::Transport;
pub use types::{Envelope, MusicianId};
