pub mod load_generator;
pub mod status;

pub use load_generator::{JourneyStats, LoadGenerator};
pub use status::StatusReporter;
