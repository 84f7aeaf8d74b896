//! Pilot input shaping: tilt, potentiometer and switches to a control command

use super::session::{ControlCommand, MAX_THROTTLE};

/// Roll values this close to neutral are reported as exactly zero
pub const ROLL_DEAD_ZONE: f32 = 0.1;

/// Raw accelerometer reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One fast tick worth of sensor readings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSample {
    pub tilt: Vector3,
    /// Throttle potentiometer position (0.0..=1.0)
    pub potentiometer: f32,
    /// Full-throttle switch asserted
    pub override_high: bool,
    /// Throttle-cut switch asserted
    pub override_low: bool,
}

/// Converts raw pilot signals into bounded commands
pub struct InputNormalizer;

impl InputNormalizer {
    /// Compute the command for one tick
    pub fn compute(sample: &SensorSample) -> ControlCommand {
        let throttle = if sample.override_high {
            MAX_THROTTLE
        } else if sample.override_low {
            0
        } else {
            Self::potentiometer_throttle(sample.potentiometer)
        };

        ControlCommand::new(i32::from(throttle), Self::roll_from_tilt(sample.tilt))
    }

    /// Map the accelerometer's x axis to a roll demand in [-1, 1].
    ///
    /// The sign is inverted so tilting the controller right rolls the lander right.
    pub fn roll_from_tilt(tilt: Vector3) -> f32 {
        let magnitude = tilt.magnitude();
        if !magnitude.is_finite() || magnitude <= f32::EPSILON {
            return 0.0;
        }

        let x = (tilt.x / magnitude).clamp(-1.0, 1.0);
        let degrees = x.asin().to_degrees();
        let roll = (-(degrees / 90.0)).clamp(-1.0, 1.0);

        if roll.abs() <= ROLL_DEAD_ZONE {
            0.0
        } else {
            roll
        }
    }

    /// Potentiometer position as a throttle percentage
    pub fn potentiometer_throttle(potentiometer: f32) -> u8 {
        if !potentiometer.is_finite() {
            return 0;
        }
        (potentiometer.clamp(0.0, 1.0) * MAX_THROTTLE as f32).round() as u8
    }

    /// Throttle after a boost press: jump to full, or back to the pot if already there
    pub fn boost_pressed(current_throttle: u8, potentiometer: f32) -> u8 {
        if current_throttle < MAX_THROTTLE {
            MAX_THROTTLE
        } else {
            Self::potentiometer_throttle(potentiometer)
        }
    }

    /// Throttle after the boost button is released
    pub fn boost_released(potentiometer: f32) -> u8 {
        Self::potentiometer_throttle(potentiometer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(potentiometer: f32, override_high: bool, override_low: bool) -> SensorSample {
        SensorSample {
            tilt: Vector3::new(0.0, 0.0, 1.0),
            potentiometer,
            override_high,
            override_low,
        }
    }

    #[test]
    fn roll_stays_in_range_for_any_tilt() {
        let tilts = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(5.0, -3.0, 0.2),
            Vector3::new(-0.7, 0.7, 0.1),
            Vector3::new(1e-3, 2.0, -9.8),
            Vector3::new(f32::MAX, 0.0, 0.0),
        ];
        for tilt in tilts {
            let roll = InputNormalizer::roll_from_tilt(tilt);
            assert!((-1.0..=1.0).contains(&roll), "roll {roll} for {tilt:?}");
        }
    }

    #[test]
    fn full_tilt_maps_to_full_roll_with_inverted_sign() {
        assert!((InputNormalizer::roll_from_tilt(Vector3::new(1.0, 0.0, 0.0)) + 1.0).abs() < 1e-5);
        assert!((InputNormalizer::roll_from_tilt(Vector3::new(-1.0, 0.0, 0.0)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn small_tilt_falls_in_dead_zone() {
        // ~5 degrees off level -> |roll| ~= 0.055
        let tilt = Vector3::new(0.087, 0.0, 0.996);
        assert_eq!(InputNormalizer::roll_from_tilt(tilt), 0.0);

        // ~30 degrees -> roll ~= -0.333
        let tilt = Vector3::new(0.5, 0.0, 0.866);
        let roll = InputNormalizer::roll_from_tilt(tilt);
        assert!((roll + 1.0 / 3.0).abs() < 1e-3);
    }

    #[test]
    fn zero_vector_is_level() {
        assert_eq!(InputNormalizer::roll_from_tilt(Vector3::default()), 0.0);
    }

    #[test]
    fn throttle_follows_potentiometer() {
        for step in 0..=100 {
            let p = step as f32 / 100.0;
            let cmd = InputNormalizer::compute(&sample(p, false, false));
            assert_eq!(cmd.throttle, (p * 100.0).round() as u8);
        }
        assert_eq!(InputNormalizer::compute(&sample(0.426, false, false)).throttle, 43);
    }

    #[test]
    fn override_switches_take_priority() {
        assert_eq!(InputNormalizer::compute(&sample(0.3, true, false)).throttle, 100);
        assert_eq!(InputNormalizer::compute(&sample(0.3, false, true)).throttle, 0);
        // full throttle wins over cut
        assert_eq!(InputNormalizer::compute(&sample(0.3, true, true)).throttle, 100);
    }

    #[test]
    fn boost_press_toggles_between_full_and_pot() {
        assert_eq!(InputNormalizer::boost_pressed(40, 0.25), 100);
        assert_eq!(InputNormalizer::boost_pressed(100, 0.25), 25);
        assert_eq!(InputNormalizer::boost_released(0.6), 60);
    }
}
