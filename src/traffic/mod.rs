//! Traffic simulation core
//!
//! The session manager schedules a fixed pool of workers over the shared URL
//! queue; the action simulator drives the randomized interactions for one
//! visit and produces its telemetry record.

mod manager;
mod simulator;

pub use manager::SessionManager;
pub use simulator::{ActionSimulator, Simulator};
