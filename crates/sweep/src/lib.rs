//! storysweep traversal and audit
//!
//! Walks a Storybook explorer tree with the keyboard and runs an
//! accessibility rule engine against every story it lands on.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SweepRunner                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  navigate_to_first_entry()                                  │
//! │  loop {                                                     │
//! │    AuditRunner::audit()      inject engine, await console   │
//! │    filter_violations() / format_entry()                     │
//! │    TraversalDriver::advance()  descend, else sibling        │
//! │    settle                                                   │
//! │    TraversalDriver::check_wrap()  offset went up? continue  │
//! │  }                                                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SelectionTracker   offsetTop / id of the selected node     │
//! │  BrowserSession     navigate, evaluate, keys, frames,       │
//! │                     scripts, console, screenshots           │
//! │    └── ChromiumSession (CDP)                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod chromium;
pub mod config;
pub mod runner;
pub mod selection;
pub mod session;
pub mod traversal;

pub use audit::{parse_report, AuditRunner, RawAudit, INVOKE_ENGINE_JS};
pub use chromium::ChromiumSession;
pub use config::{BrowserSettings, ScreenshotMode, Selectors, SweepConfig};
pub use runner::{SweepRunner, FAILURE_SCREENSHOT};
pub use selection::SelectionTracker;
pub use session::{BrowserSession, ConsoleStream, FrameRef, Key};
pub use traversal::{AdvanceAttempt, AdvanceOutcome, TraversalDriver, WrapCheck};
