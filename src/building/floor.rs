/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::BuildingConfig;
use crate::shared::{Direction, FloorIndex, SimError};

/***************************************/
/*              Buttons                */
/***************************************/
/// A call button. Pressing an already pressed button, or cancelling an idle
/// one, leaves it untouched and reports `false`.
#[derive(Debug, Default)]
pub struct Button {
    pressed: AtomicBool,
}

impl Button {
    pub fn press(&self) -> bool {
        !self.pressed.swap(true, Ordering::SeqCst)
    }

    pub fn cancel(&self) -> bool {
        self.pressed.swap(false, Ordering::SeqCst)
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }
}

/***************************************/
/*               Floor                 */
/***************************************/
#[derive(Debug)]
pub struct Floor {
    index: FloorIndex,
    offset: f64,
    up_button: Button,
    down_button: Button,
}

impl Floor {
    pub fn new(index: FloorIndex, floor_height: f64) -> Floor {
        Floor {
            index,
            offset: level_of(index) as f64 * floor_height,
            up_button: Button::default(),
            down_button: Button::default(),
        }
    }

    pub fn index(&self) -> FloorIndex {
        self.index
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn button(&self, direction: Direction) -> Option<&Button> {
        match direction {
            Direction::Up => Some(&self.up_button),
            Direction::Down => Some(&self.down_button),
            Direction::None => None,
        }
    }

    pub fn press(&self, direction: Direction) {
        if let Some(button) = self.button(direction) {
            if button.press() {
                debug!("Floor {}: {:?} button pressed", self.index, direction);
            }
        }
    }

    pub fn cancel(&self, direction: Direction) {
        if let Some(button) = self.button(direction) {
            if button.cancel() {
                debug!("Floor {}: {:?} button cancelled", self.index, direction);
            }
        }
    }
}

/// Contiguous level of a floor, counted from the ground floor (level 0).
fn level_of(index: FloorIndex) -> i64 {
    if index > 0 {
        index as i64 - 1
    } else {
        index as i64
    }
}

fn index_of(level: i64) -> FloorIndex {
    if level >= 0 {
        (level + 1) as FloorIndex
    } else {
        level as FloorIndex
    }
}

/***************************************/
/*            Floor table              */
/***************************************/
/**
 * Every floor of the building, ordered bottom to top.
 *
 * Built once from the building configuration and shared read-only by the
 * elevators, riders and the load generator. Also owns the conversions
 * between floor numbers and positions in the shaft.
 */
#[derive(Debug)]
pub struct FloorTable {
    floors: Vec<Arc<Floor>>,
    floor_height: f64,
}

impl FloorTable {
    pub fn new(config: &BuildingConfig) -> FloorTable {
        let below = config.floors_below_ground as FloorIndex;
        let above = config.floors_above_ground as FloorIndex;

        let floors = (-below..=above)
            .filter(|index| *index != 0)
            .map(|index| Arc::new(Floor::new(index, config.floor_height)))
            .collect();

        FloorTable {
            floors,
            floor_height: config.floor_height,
        }
    }

    pub fn len(&self) -> usize {
        self.floors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    pub fn floor_height(&self) -> f64 {
        self.floor_height
    }

    pub fn lowest(&self) -> FloorIndex {
        self.floors.first().map(|f| f.index()).unwrap_or(1)
    }

    pub fn highest(&self) -> FloorIndex {
        self.floors.last().map(|f| f.index()).unwrap_or(1)
    }

    pub fn lowest_offset(&self) -> f64 {
        level_of(self.lowest()) as f64 * self.floor_height
    }

    pub fn highest_offset(&self) -> f64 {
        level_of(self.highest()) as f64 * self.floor_height
    }

    pub fn indices(&self) -> impl Iterator<Item = FloorIndex> + '_ {
        self.floors.iter().map(|f| f.index())
    }

    pub fn contains(&self, index: FloorIndex) -> bool {
        index != 0 && index >= self.lowest() && index <= self.highest()
    }

    pub fn get(&self, index: FloorIndex) -> Result<&Arc<Floor>, SimError> {
        if !self.contains(index) {
            return Err(SimError::InvalidFloorReference(index));
        }
        let slot = (level_of(index) - level_of(self.lowest())) as usize;
        self.floors
            .get(slot)
            .ok_or(SimError::InvalidFloorReference(index))
    }

    pub fn offset_of(&self, index: FloorIndex) -> Result<f64, SimError> {
        self.get(index).map(|floor| floor.offset())
    }

    /// Floor whose offset is closest to `position`.
    pub fn floor_at(&self, position: f64) -> Result<FloorIndex, SimError> {
        if !position.is_finite() {
            return Err(SimError::PositionOutOfRange(position));
        }
        let index = index_of((position / self.floor_height).round() as i64);
        if !self.contains(index) {
            return Err(SimError::InvalidFloorReference(index));
        }
        Ok(index)
    }

    /// Offset of the floor closest to `position`, clamped to the shaft.
    pub fn nearest_offset(&self, position: f64) -> f64 {
        let level = (position / self.floor_height).round() as i64;
        let level = level.clamp(level_of(self.lowest()), level_of(self.highest()));
        level as f64 * self.floor_height
    }

    /// Offset of the first floor at or beyond `position` when travelling in
    /// `direction`, clamped to the shaft.
    pub fn next_offset(&self, position: f64, direction: Direction) -> f64 {
        let ratio = position / self.floor_height;
        let level = match direction {
            Direction::Up => (ratio - 1e-9).ceil(),
            Direction::Down => (ratio + 1e-9).floor(),
            Direction::None => ratio.round(),
        } as i64;
        let level = level.clamp(level_of(self.lowest()), level_of(self.highest()));
        level as f64 * self.floor_height
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod floor_tests {
    use super::*;

    fn building(above: u8, below: u8) -> BuildingConfig {
        BuildingConfig {
            floors_above_ground: above,
            floors_below_ground: below,
            floor_height: 3.0,
            n_elevators: 1,
        }
    }

    #[test]
    fn test_table_skips_floor_zero() {
        let table = FloorTable::new(&building(3, 2));
        let indices: Vec<FloorIndex> = table.indices().collect();

        assert_eq!(indices, vec![-2, -1, 1, 2, 3]);
        assert_eq!(table.lowest(), -2);
        assert_eq!(table.highest(), 3);
        assert!(!table.contains(0));
    }

    #[test]
    fn test_offsets_are_contiguous_across_ground() {
        let table = FloorTable::new(&building(3, 2));

        assert_eq!(table.offset_of(1).unwrap(), 0.0);
        assert_eq!(table.offset_of(3).unwrap(), 6.0);
        assert_eq!(table.offset_of(-1).unwrap(), -3.0);
        assert_eq!(table.offset_of(-2).unwrap(), -6.0);
        assert_eq!(table.lowest_offset(), -6.0);
        assert_eq!(table.highest_offset(), 6.0);
    }

    #[test]
    fn test_floor_lookup_rejects_unknown_floors() {
        let table = FloorTable::new(&building(3, 0));

        assert_eq!(table.get(0).unwrap_err(), SimError::InvalidFloorReference(0));
        assert_eq!(table.get(4).unwrap_err(), SimError::InvalidFloorReference(4));
        assert_eq!(table.get(-1).unwrap_err(), SimError::InvalidFloorReference(-1));
    }

    #[test]
    fn test_position_to_floor_rounds_to_nearest() {
        let table = FloorTable::new(&building(5, 1));

        assert_eq!(table.floor_at(0.0).unwrap(), 1);
        assert_eq!(table.floor_at(1.4).unwrap(), 1);
        assert_eq!(table.floor_at(1.6).unwrap(), 2);
        assert_eq!(table.floor_at(-2.9).unwrap(), -1);
        assert!(table.floor_at(30.0).is_err());
        assert!(table.floor_at(f64::NAN).is_err());
    }

    #[test]
    fn test_nearest_offset_is_clamped_to_shaft() {
        let table = FloorTable::new(&building(3, 0));

        assert_eq!(table.nearest_offset(4.4), 3.0);
        assert_eq!(table.nearest_offset(100.0), 6.0);
        assert_eq!(table.nearest_offset(-5.0), 0.0);
    }

    #[test]
    fn test_next_offset_follows_travel_direction() {
        let table = FloorTable::new(&building(3, 1));

        assert_eq!(table.next_offset(3.2, Direction::Up), 6.0);
        assert_eq!(table.next_offset(3.2, Direction::Down), 3.0);
        assert_eq!(table.next_offset(3.0, Direction::Up), 3.0);
        assert_eq!(table.next_offset(-1.0, Direction::Down), -3.0);
        assert_eq!(table.next_offset(7.5, Direction::Up), 6.0);
    }

    #[test]
    fn test_buttons_are_idempotent() {
        let floor = Floor::new(2, 3.0);

        floor.press(Direction::Up);
        floor.press(Direction::Up);
        assert!(floor.button(Direction::Up).unwrap().is_pressed());
        assert!(!floor.button(Direction::Down).unwrap().is_pressed());

        floor.cancel(Direction::Up);
        assert!(!floor.button(Direction::Up).unwrap().is_pressed());
        assert!(!floor.button(Direction::Up).unwrap().cancel());
        assert!(floor.button(Direction::None).is_none());
    }
}
