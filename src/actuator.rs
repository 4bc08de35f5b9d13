use std::time::Duration;

use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

/// The physical side of the robot, as seen by the command dispatcher.
///
/// Motion calls run the motors for the given duration and block until it
/// has elapsed; the caller follows up with `stop`. How far a given
/// duration actually moves the chassis is this layer's problem, not the
/// protocol engine's.
pub trait Actuator {
    fn turn(&mut self, dir: Turn, duration: Duration);
    fn drive_forward(&mut self, duration: Duration);
    fn drive_backward(&mut self, duration: Duration);
    fn stop(&mut self);
    fn display_clear(&mut self);
    fn display_write_at(&mut self, x: u8, y: u8, text: &[u8]);
    /// Point the ranging sensor. 90 degrees is straight ahead; smaller
    /// values point left, larger point right.
    fn point_sensor(&mut self, angle: i32);
    /// One raw range sample in millimeters.
    fn sample_range(&mut self) -> i32;
    /// Battery voltage in millivolts.
    fn battery_level(&mut self) -> f32;
}

/// Software stand-in for the robot. Logs every action and synthesizes
/// ranges from the sensor angle, so the engine can run end-to-end on a
/// bench with no hardware attached.
#[derive(Debug, Default)]
pub struct SimActuator {
    angle: i32,
}

impl Actuator for SimActuator {
    fn turn(&mut self, dir: Turn, duration: Duration) {
        info!("[sim] turn {:?} for {:?}", dir, duration);
    }

    fn drive_forward(&mut self, duration: Duration) {
        info!("[sim] drive forward for {:?}", duration);
    }

    fn drive_backward(&mut self, duration: Duration) {
        info!("[sim] drive backward for {:?}", duration);
    }

    fn stop(&mut self) {
        info!("[sim] stop");
    }

    fn display_clear(&mut self) {
        info!("[sim] display clear");
    }

    fn display_write_at(&mut self, x: u8, y: u8, text: &[u8]) {
        info!(
            "[sim] display ({}, {}): {}",
            x,
            y,
            String::from_utf8_lossy(text)
        );
    }

    fn point_sensor(&mut self, angle: i32) {
        info!("[sim] point sensor to {} deg", angle);
        self.angle = angle;
    }

    fn sample_range(&mut self) -> i32 {
        // fake wall 1.2 m ahead, receding toward the sides
        1200 + (self.angle - 90).abs() * 10
    }

    fn battery_level(&mut self) -> f32 {
        4875.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_range_tracks_sensor_angle() {
        let mut sim = SimActuator::default();
        sim.point_sensor(90);
        assert_eq!(sim.sample_range(), 1200);
        sim.point_sensor(60);
        assert_eq!(sim.sample_range(), 1500);
    }
}
