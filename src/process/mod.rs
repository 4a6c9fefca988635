//! Child process supervision.
//!
//! ```text
//! ProcessSupervisor  (owns zero or one SupervisedProcess)
//!        |
//!     Launcher       (CommandLauncher in production)
//! ```

mod launcher;
mod supervisor;

pub use launcher::{ChildHandle, CommandLauncher, LaunchSpec, Launcher};
pub use supervisor::{ProcessSupervisor, SupervisedProcess};
