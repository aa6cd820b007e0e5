// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds the CLI and terminal setup on top.
pub mod app;
pub mod clock;
pub mod completion;
pub mod config;
pub mod logging;
pub mod runtime;
pub mod schedule;
pub mod session;
pub mod slot;
pub mod spawner;
pub mod ui;

pub use completion::{CompletionRecord, CompletionSink, Rating, SinkError};
pub use config::Settings;
pub use session::{Phase, Session, SessionState};
pub use slot::{SlotId, SpawnSlot};
pub use spawner::{SpawnEvent, SpawnScheduler};

/// Default redraw/poll interval of the terminal loop.
pub const TICK_RATE_MS: u64 = 50;
