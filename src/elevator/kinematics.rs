/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::ElevatorConfig;

/// Distance and speed under which the cabin counts as stopped at a target.
pub const EPSILON: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: f64,
    pub velocity: f64,
}

impl Motion {
    pub fn at_rest(position: f64) -> Motion {
        Motion {
            position,
            velocity: 0.0,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.velocity.abs() < EPSILON
    }

    pub fn is_at(&self, target: f64) -> bool {
        (self.position - target).abs() < EPSILON && self.is_stopped()
    }
}

/// Accelerate / cruise / decelerate rule for one shaft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    pub max_speed: f64,
    pub acceleration: f64,
    pub deceleration_threshold: f64,
    pub creep_speed: f64,
}

impl From<&ElevatorConfig> for MotionProfile {
    fn from(config: &ElevatorConfig) -> Self {
        MotionProfile {
            max_speed: config.max_speed,
            acceleration: config.acceleration,
            deceleration_threshold: config.deceleration_threshold,
            creep_speed: config.creep_speed,
        }
    }
}

impl MotionProfile {
    pub fn braking_distance(&self, speed: f64) -> f64 {
        speed * speed / (2.0 * self.acceleration)
    }

    pub fn should_decelerate(&self, remaining: f64, speed: f64) -> bool {
        remaining <= self.braking_distance(speed).max(self.deceleration_threshold)
    }

    /**
     * Integrates one tick of `dt` seconds towards `target`.
     *
     * Speed along the travel direction grows by `acceleration * dt` up to
     * `max_speed` until the deceleration zone is reached. Inside the zone it
     * shrinks by the same amount, but never below the approach speed
     * `min(creep_speed, sqrt(2 * a * remaining))`, so the cabin cannot stall
     * short of the target. Position uses the average of old and new speed, and
     * a step that would pass the target ends exactly on it with zero velocity.
     */
    pub fn advance(&self, motion: Motion, target: f64, dt: f64) -> Motion {
        let remaining = target - motion.position;
        let distance = remaining.abs();
        if distance < EPSILON {
            return Motion::at_rest(target);
        }

        let sign = remaining.signum();
        let speed = motion.velocity * sign;
        let delta_v = self.acceleration * dt;
        let approach = self
            .creep_speed
            .min((2.0 * self.acceleration * distance).sqrt());

        let next_speed = if speed < 0.0 {
            // Travelling away from the target: brake first.
            (speed + delta_v).min(approach)
        } else if self.should_decelerate(distance, speed) {
            (speed - delta_v).max(approach.min(speed + delta_v))
        } else {
            (speed + delta_v).min(self.max_speed)
        };

        let moved = (speed + next_speed) / 2.0 * dt;
        if moved >= distance {
            return Motion::at_rest(target);
        }

        Motion {
            position: motion.position + sign * moved,
            velocity: sign * next_speed,
        }
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
