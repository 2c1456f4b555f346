/* Modules */
pub mod building;
pub mod config;
pub mod dispatcher;
pub mod elevator;
pub mod rider;
pub mod runtime;
pub mod shared;
pub mod sim;

/* Re-exports */
pub use building::Building;
pub use config::Config;
pub use runtime::{Runtime, SimClock};
