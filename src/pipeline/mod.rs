pub mod generator;
pub mod pattern;
pub mod sequencer;

pub use generator::{CommandGenerator, GenerateError, GeneratedPattern, PatternGenerator};
pub use pattern::Pattern;
pub use sequencer::{DueStep, Sequencer, Transport};
