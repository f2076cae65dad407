// Library surface: the round engine and the plumbing around it.
// Rendering lives in the binary (main.rs + ui).
pub mod clock;
pub mod config;
pub mod countdown;
pub mod engine;
pub mod logging;
pub mod prompt;
pub mod runtime;
pub mod session;
pub mod util;

pub use engine::{EngineEvent, RoundEngine};
pub use session::{GameStatus, GameView};
