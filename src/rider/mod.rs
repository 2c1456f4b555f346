pub mod fsm;
pub mod request;
pub mod rider;

pub use fsm::{RiderContext, RiderFSM};
pub use request::{RideRequest, SharedRequest};
pub use rider::{Rider, RiderEvent, RiderStatus};
