pub mod error;
pub mod macros;
pub mod structs;
pub mod sync;

pub use error::{ConfigError, SimError};
pub use structs::{
    BuildingSnapshot, Direction, DoorState, ElevatorId, ElevatorSnapshot, FloorIndex, Location,
    MotionState, RiderId, RiderSnapshot, RiderState,
};
