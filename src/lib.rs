// Opening tree exploration driven by an external UCI engine
pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod explore;
pub mod moves;
pub mod output;

pub use engine::{Candidates, Engine, EngineSettings, ProcessEngine};
pub use error::{EngineError, ExploreError};
pub use explore::{ExploreParams, Explorer, Oracle, Progress, CP_THRESHOLD};
pub use moves::{Move, MoveSequence};
