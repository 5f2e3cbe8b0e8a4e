//! Polling: the per-cycle controller, the auto-check timer, and the event
//! loop that ties them to user commands.

pub mod controller;
pub mod engine;
pub mod state;
pub mod timer;

pub use self::controller::{CycleOutcome, PollController};
pub use self::engine::{read_commands, run_event_loop, Command};
pub use self::state::EngineState;
pub use self::timer::{AutoCheck, AutoCheckTimer};
