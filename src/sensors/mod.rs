//! Sensors attached to a robot
//!
//! The prediction core knows nothing about what a sensor measures. After a
//! motion update the robot fans out to its linked sensors through
//! [`Sensor::process`]; any correction step lives behind that hook.

use nalgebra::RealField;

use crate::map::SlamMap;
use crate::types::handles::ObjectId;
use crate::Result;

/// Trait for observers linked to a robot.
pub trait Sensor<T: RealField> {
    /// Short name used in logs and summaries.
    fn name(&self) -> &str {
        "sensor"
    }

    /// Records the robot this sensor is mounted on.
    fn link_to_robot(&mut self, robot: ObjectId);

    /// Runs the sensor's own processing for the robot's freshly predicted pose.
    fn process(&mut self, robot: ObjectId, map: &mut SlamMap<T>) -> Result<()>;
}
