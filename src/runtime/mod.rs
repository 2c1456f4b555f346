pub mod clock;
pub mod events;
pub mod runtime;
pub mod runtime_tests;

pub use clock::SimClock;
pub use events::EventBus;
pub use runtime::{Actor, Runtime, Spawner, Step};
