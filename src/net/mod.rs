//! Shot replication
//!
//! The authoritative flow computes a `ShotResult` locally and sends it once
//! as `shotRecord`. The fire/segment/hit/complete messages are an optional
//! preview stream for progressive animation only.

pub mod broadcast;
pub mod inbox;
pub mod messages;

pub use broadcast::{BroadcastMode, BroadcastReport, Broadcaster, LoopbackTransport, Transport};
pub use inbox::{Preview, PreviewHit, Received, ShotInbox};
pub use messages::{WireMessage, WireSegment, decode, encode, preview_stream};
