/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::sync::Mutex;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::sync::lock;
use crate::shared::{Direction, FloorIndex};

/**
 * Ordered set of floors an elevator still has to visit.
 *
 * All access goes through a single mutex, so the scheduler, a rider pressing
 * a cabin button and the elevator's own loop never observe a half-updated
 * queue. A floor is present at most once.
 */
#[derive(Debug, Default)]
pub struct PathQueue {
    floors: Mutex<Vec<FloorIndex>>,
}

impl PathQueue {
    pub fn new() -> PathQueue {
        PathQueue::default()
    }

    /// Adds `floor` and re-sorts for `direction`. Returns `false` if the floor
    /// was already queued, in which case nothing changes.
    pub fn enqueue(&self, floor: FloorIndex, direction: Direction) -> bool {
        let mut floors = lock(&self.floors);
        if floors.contains(&floor) {
            return false;
        }
        floors.push(floor);
        match direction {
            Direction::Up => floors.sort_unstable(),
            Direction::Down => floors.sort_unstable_by(|a, b| b.cmp(a)),
            Direction::None => (),
        }
        true
    }

    pub fn head(&self) -> Option<FloorIndex> {
        lock(&self.floors).first().copied()
    }

    /// Removes `floor` after a stop. The queue may have been re-sorted since
    /// the floor was read as head, so it is removed wherever it sits.
    pub fn dequeue(&self, floor: FloorIndex) -> bool {
        let mut floors = lock(&self.floors);
        match floors.iter().position(|f| *f == floor) {
            Some(position) => {
                floors.remove(position);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) -> Vec<FloorIndex> {
        std::mem::take(&mut *lock(&self.floors))
    }

    pub fn len(&self) -> usize {
        lock(&self.floors).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.floors).is_empty()
    }

    pub fn to_vec(&self) -> Vec<FloorIndex> {
        lock(&self.floors).clone()
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod path_queue_tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_enqueue_up_sorts_ascending() {
        let queue = PathQueue::new();

        queue.enqueue(3, Direction::Up);
        queue.enqueue(7, Direction::Up);
        queue.enqueue(5, Direction::Up);

        assert_eq!(queue.to_vec(), vec![3, 5, 7]);
    }

    #[test]
    fn test_enqueue_down_sorts_descending() {
        let queue = PathQueue::new();

        queue.enqueue(-1, Direction::Down);
        queue.enqueue(4, Direction::Down);
        queue.enqueue(2, Direction::Down);

        assert_eq!(queue.to_vec(), vec![4, 2, -1]);
    }

    #[test]
    fn test_enqueue_none_keeps_arrival_order() {
        let queue = PathQueue::new();

        queue.enqueue(6, Direction::None);
        queue.enqueue(2, Direction::None);

        assert_eq!(queue.to_vec(), vec![6, 2]);
    }

    #[test]
    fn test_duplicate_enqueue_is_noop() {
        let queue = PathQueue::new();
        queue.enqueue(5, Direction::Up);
        queue.enqueue(2, Direction::None);

        let added = queue.enqueue(5, Direction::Up);

        assert!(!added);
        assert_eq!(queue.to_vec(), vec![5, 2]);
    }

    #[test]
    fn test_dequeue_removes_floor_anywhere() {
        let queue = PathQueue::new();
        queue.enqueue(2, Direction::Up);
        queue.enqueue(4, Direction::Up);

        assert!(queue.dequeue(4));
        assert!(!queue.dequeue(4));
        assert_eq!(queue.to_vec(), vec![2]);
        assert_eq!(queue.clear(), vec![2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_enqueue_keeps_both_floors() {
        // Arrange
        let queue = Arc::new(PathQueue::new());

        // Act
        for _ in 0..200 {
            queue.clear();
            let scheduler = {
                let queue = queue.clone();
                thread::spawn(move || queue.enqueue(8, Direction::Up))
            };
            let cabin = {
                let queue = queue.clone();
                thread::spawn(move || queue.enqueue(3, Direction::Up))
            };
            scheduler.join().unwrap();
            cabin.join().unwrap();

            // Assert
            assert_eq!(queue.to_vec(), vec![3, 8]);
        }
    }
}
