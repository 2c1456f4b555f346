pub mod door;
pub mod elevator;
pub mod fsm;
pub mod fsm_tests;
pub mod kinematics;
pub mod path_queue;

pub use door::DoorCycle;
pub use elevator::{Elevator, ElevatorEvent, ElevatorStatus};
pub use fsm::ElevatorFSM;
pub use kinematics::{Motion, MotionProfile};
pub use path_queue::PathQueue;
