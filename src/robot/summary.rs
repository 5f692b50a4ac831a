//! Human-readable robot state dumps

use alloc::string::String;
use alloc::vec::Vec;
use ::core::fmt;

use nalgebra::{DVector, RealField};

use crate::types::control::Control;
use crate::types::gaussian::Gaussian;
use crate::types::handles::ObjectId;

/// Snapshot of a robot's pose, control and process noise.
///
/// Built by [`crate::robot::Robot::summary`]; the `Display` layout is meant for
/// logs and is not stable.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotSummary<T: RealField> {
    pub id: ObjectId,
    pub pose: Gaussian<T>,
    pub control: Control<T>,
    /// Diagonal of the process noise `Q`
    pub perturbation: DVector<T>,
    pub sensors: Vec<String>,
}

impl<T: RealField + Copy> RobotSummary<T> {
    pub(crate) fn new(
        id: ObjectId,
        pose: Gaussian<T>,
        control: Control<T>,
        perturbation: DVector<T>,
        sensors: Vec<String>,
    ) -> Self {
        Self {
            id,
            pose,
            control,
            perturbation,
            sensors,
        }
    }

    /// Standard deviations of the pose components.
    pub fn pose_std(&self) -> DVector<T> {
        self.pose.covariance().diagonal().map(|v| v.sqrt())
    }
}

fn write_row<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: impl Iterator<Item = T>) -> fmt::Result {
    write!(f, "[")?;
    for (i, v) in values.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{:.4}", v)?;
    }
    write!(f, "]")
}

impl<T: RealField + Copy> fmt::Display for RobotSummary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Robot {} ({} states, {} controls)",
            self.id,
            self.pose.size(),
            self.control.size()
        )?;
        write!(f, "  pose:    ")?;
        write_row(f, self.pose.mean().iter())?;
        write!(f, "\n  std:     ")?;
        write_row(f, self.pose_std().iter())?;
        write!(f, "\n  control: ")?;
        write_row(f, self.control.mean().iter())?;
        writeln!(f, " over dt = {:.4}", self.control.dt)?;
        write!(f, "  Q diag:  ")?;
        write_row(f, self.perturbation.iter())?;
        if !self.sensors.is_empty() {
            write!(f, "\n  sensors: {}", self.sensors.join(", "))?;
        }
        Ok(())
    }
}
