//! Playback core
//!
//! The replay pipeline for one project run: load each stream's source,
//! pace rows per its policy, publish to the bus, aggregate progress, and
//! relay snapshots and terminal notices to the observer.

pub mod emitter;
pub mod policy;
pub mod progress;
pub mod session;
pub mod source;
pub mod task;

pub use emitter::{Emitter, TcpEmitter};
pub use policy::PlaybackPolicy;
pub use progress::{ProgressAggregator, ProgressEntry};
pub use session::{PlaybackSession, SessionHandle};
pub use task::{StreamPlaybackTask, TaskEvent, TaskOutcome};
