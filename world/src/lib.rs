#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative room state for a liminal walk.
//!
//! The world owns the visited ledger that freezes every generated room, the
//! catalog that reads through it, and the windowed pool that tracks which
//! rooms around the traveller are realized by the renderer.

mod catalog;
mod ledger;
mod pool;
mod registry;

pub use catalog::RoomCatalog;
pub use ledger::{VisitStamp, VisitedLedger, VisitedRecord};
pub use pool::{AttachOutcome, PoolConfig, PoolStats, PooledEntry, RealizationRequest, RoomPool};
pub use registry::{BufferId, BufferRegistry, RealizedRoom};
