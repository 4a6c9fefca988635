//! Directory watching and event coalescing.
//!
//! # Architecture
//!
//! ```text
//! NotificationSource (NotifySource over notify::RecommendedWatcher)
//!         |  try_next() until empty, once per interval
//!         v
//! EventCoalescer ---> DirectorySet (subscribe / unsubscribe)
//!         |
//!    CycleReport -> ReloadDecision
//! ```

mod coalescer;
mod directory_set;
mod error;
mod source;
mod walk;

pub use coalescer::{CycleReport, EventCoalescer, ReloadDecision};
pub use directory_set::DirectorySet;
pub use error::WatchError;
pub use source::{ChangeEvent, ChangeKind, NotificationSource, NotifySource, SourceItem};
pub use walk::{Exclusions, watch_tree};
