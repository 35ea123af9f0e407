//! Nodal loads: point forces and prescribed displacements.
//!
//! The two kinds decide which axes they act on differently. A force is active on
//! every axis with a nonzero component, while a displacement is active on every
//! axis that was given a value at all, so an explicit `Some(0.0)` pins that axis
//! and `None` leaves it free.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dof::{Dof, DofSet};
use crate::model::NodeId;

/// A point force applied at a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceLoad {
    /// Component along the global X axis.
    pub x: f64,
    /// Component along the global Y axis.
    pub y: f64,
    /// Component along the global Z axis.
    pub z: f64,
}

impl ForceLoad {
    /// Create a [`ForceLoad`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component along `dof`.
    #[must_use]
    pub fn component(&self, dof: Dof) -> f64 {
        match dof {
            Dof::X => self.x,
            Dof::Y => self.y,
            Dof::Z => self.z,
        }
    }

    /// Axes carrying a nonzero component.
    #[must_use]
    pub fn active_dofs(&self) -> DofSet {
        Dof::ALL
            .into_iter()
            .filter(|&dof| self.component(dof) != 0.0)
            .collect()
    }

    /// Scalar magnitude of the force.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.to_vector().norm()
    }

    /// Direction of the force, `None` for a zero force.
    #[must_use]
    pub fn unit_vector(&self) -> Option<Vector3<f64>> {
        self.to_vector().try_normalize(0.0)
    }

    /// Convert the force into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// A prescribed displacement applied at a node.
///
/// # Examples
/// ```
/// use trussfea::{Dof, DisplacementLoad};
///
/// let roller = DisplacementLoad::new(None, Some(0.0), None);
/// assert!(roller.active_dofs().contains(Dof::Y));
/// assert!(!roller.active_dofs().contains(Dof::X));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplacementLoad {
    /// Prescribed value along the global X axis.
    #[serde(default)]
    pub x: Option<f64>,
    /// Prescribed value along the global Y axis.
    #[serde(default)]
    pub y: Option<f64>,
    /// Prescribed value along the global Z axis.
    #[serde(default)]
    pub z: Option<f64>,
}

impl DisplacementLoad {
    /// Create a [`DisplacementLoad`] with explicit components.
    #[must_use]
    pub const fn new(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        Self { x, y, z }
    }

    /// Pin both in-plane axes at zero.
    #[must_use]
    pub const fn pinned() -> Self {
        Self::new(Some(0.0), Some(0.0), None)
    }

    /// Fix X at zero, leaving the node free to roll along Y.
    #[must_use]
    pub const fn roller_x() -> Self {
        Self::new(Some(0.0), None, None)
    }

    /// Fix Y at zero, leaving the node free to roll along X.
    #[must_use]
    pub const fn roller_y() -> Self {
        Self::new(None, Some(0.0), None)
    }

    /// Prescribed value along `dof`, if any.
    #[must_use]
    pub fn component(&self, dof: Dof) -> Option<f64> {
        match dof {
            Dof::X => self.x,
            Dof::Y => self.y,
            Dof::Z => self.z,
        }
    }

    /// Axes with a prescribed value, zero included.
    #[must_use]
    pub fn active_dofs(&self) -> DofSet {
        Dof::ALL
            .into_iter()
            .filter(|&dof| self.component(dof).is_some())
            .collect()
    }
}

/// The kind and value of a nodal load.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadKind {
    /// Point force.
    Force(ForceLoad),
    /// Prescribed displacement.
    Displacement(DisplacementLoad),
}

/// A load bound to a node of a model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Load {
    /// Node the load acts on.
    pub node: NodeId,
    /// Load kind and components.
    #[serde(flatten)]
    pub kind: LoadKind,
}

impl Load {
    /// Axes the load acts on.
    #[must_use]
    pub fn active_dofs(&self) -> DofSet {
        match &self.kind {
            LoadKind::Force(force) => force.active_dofs(),
            LoadKind::Displacement(displacement) => displacement.active_dofs(),
        }
    }

    /// The force, if this is a force load.
    #[must_use]
    pub fn as_force(&self) -> Option<&ForceLoad> {
        match &self.kind {
            LoadKind::Force(force) => Some(force),
            LoadKind::Displacement(_) => None,
        }
    }

    /// The prescribed displacement, if this is a displacement load.
    #[must_use]
    pub fn as_displacement(&self) -> Option<&DisplacementLoad> {
        match &self.kind {
            LoadKind::Displacement(displacement) => Some(displacement),
            LoadKind::Force(_) => None,
        }
    }
}
