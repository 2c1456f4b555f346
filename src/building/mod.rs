pub mod building;
pub mod floor;

pub use building::Building;
pub use floor::{Button, Floor, FloorTable};
