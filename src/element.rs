//! Two-node axial link element lying in the XY plane.
//!
//! The element carries axial stiffness only. Its local frame has the x axis
//! running from the first node to the second; local degrees of freedom are
//! ordered `u1x, u1y, u2x, u2y`.

use nalgebra::{SMatrix, SVector};
use serde::Serialize;

use crate::dof::{Dof, DofSet};
use crate::errors::ModelError;
use crate::geometry::Point;

/// Element-sized square matrix.
pub type Matrix4 = SMatrix<f64, 4, 4>;

/// Element-sized vector of nodal values.
pub type Vector4 = SVector<f64, 4>;

/// Axial response of a member recovered from a solved displacement field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MemberResponse {
    /// Change in length, positive in tension.
    pub elongation: f64,
    /// Axial force, positive in tension.
    pub axial_force: f64,
    /// Axial stress, positive in tension.
    pub axial_stress: f64,
}

/// A planar two-node axial link.
///
/// All derived quantities are computed when the link is built; the endpoints,
/// area and modulus cannot change afterwards, so they never go stale.
#[derive(Clone, Debug, PartialEq)]
pub struct Link2D {
    /// Cross-sectional area.
    area: f64,
    /// Elastic modulus of the member material.
    elastic_modulus: f64,
    /// Distance between the endpoints.
    length: f64,
    /// Angle of the member axis from the global X axis, in radians.
    angle: f64,
    /// Stiffness in the element frame.
    local_stiffness: Matrix4,
    /// Rotation from global nodal values to element-frame values.
    transformation: Matrix4,
    /// Stiffness in the global frame.
    stiffness: Matrix4,
}

impl Link2D {
    /// Number of nodes forming the element.
    pub const NODES: usize = 2;

    /// Degrees of freedom carried by each node.
    pub const DOFS: [Dof; 2] = [Dof::X, Dof::Y];

    /// Number of degrees of freedom per node.
    pub const DOFS_PER_NODE: usize = Self::DOFS.len();

    /// Build a link between `start` and `end`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NonPositiveArea`] or [`ModelError::NonPositiveElasticModulus`]
    /// for non-physical properties, [`ModelError::NonFiniteGeometry`] for NaN or infinite
    /// coordinates, [`ModelError::OutOfPlane`] when the endpoints differ in z and
    /// [`ModelError::CoincidentNodes`] when they share the same position.
    ///
    /// # Examples
    /// ```
    /// use trussfea::{point, Link2D};
    ///
    /// let link = Link2D::new(point(0.0, 0.0, 0.0), point(3.0, 4.0, 0.0), 1.0, 1.0).unwrap();
    /// assert_eq!(link.length(), 5.0);
    /// assert_eq!(link.stiffness(), &link.stiffness().transpose());
    /// ```
    pub fn new(
        start: Point,
        end: Point,
        elastic_modulus: f64,
        area: f64,
    ) -> Result<Self, ModelError> {
        if area <= 0.0 || !area.is_finite() {
            return Err(ModelError::NonPositiveArea(area));
        }
        if elastic_modulus <= 0.0 || !elastic_modulus.is_finite() {
            return Err(ModelError::NonPositiveElasticModulus(elastic_modulus));
        }
        let finite = |p: Point| p.x.is_finite() && p.y.is_finite() && p.z.is_finite();
        if !finite(start) || !finite(end) {
            return Err(ModelError::NonFiniteGeometry);
        }
        if start.z != end.z {
            return Err(ModelError::OutOfPlane {
                start_z: start.z,
                end_z: end.z,
            });
        }
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        if dx == 0.0 && dy == 0.0 {
            return Err(ModelError::CoincidentNodes);
        }

        let length = start.distance_to(end);
        if !length.is_finite() {
            return Err(ModelError::NonFiniteGeometry);
        }
        let angle = dy.atan2(dx);
        let ea_over_l = elastic_modulus * area / length;

        #[rustfmt::skip]
        let local_stiffness = ea_over_l * Matrix4::from_row_slice(&[
             1.0, 0.0, -1.0, 0.0,
             0.0, 0.0,  0.0, 0.0,
            -1.0, 0.0,  1.0, 0.0,
             0.0, 0.0,  0.0, 0.0,
        ]);

        let (s, c) = angle.sin_cos();
        #[rustfmt::skip]
        let transformation = Matrix4::from_row_slice(&[
             c,   s,   0.0, 0.0,
            -s,   c,   0.0, 0.0,
             0.0, 0.0, c,   s,
             0.0, 0.0, -s,  c,
        ]);

        let rotated = transformation.transpose() * local_stiffness * transformation;
        // Exactly symmetric regardless of rounding in the products.
        let stiffness = (rotated + rotated.transpose()) * 0.5;

        Ok(Self {
            area,
            elastic_modulus,
            length,
            angle,
            local_stiffness,
            transformation,
            stiffness,
        })
    }

    /// Degrees of freedom a node gains by being attached to a link.
    #[must_use]
    pub fn dof_set() -> DofSet {
        DofSet::of(&Self::DOFS)
    }

    /// Map a row or column of the element matrix to `(endpoint, label)`.
    ///
    /// Endpoint `0` is the first node and `1` the second.
    #[must_use]
    pub fn local_dof(local_index: usize) -> (usize, Dof) {
        let node = local_index / Self::DOFS_PER_NODE;
        (node, Self::DOFS[local_index % Self::DOFS_PER_NODE])
    }

    /// Cross-sectional area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Elastic modulus of the member material.
    #[must_use]
    pub fn elastic_modulus(&self) -> f64 {
        self.elastic_modulus
    }

    /// Distance between the endpoints.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Angle of the member axis measured from the global X axis, in `(-π, π]`.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Axial stiffness `E·A/L`.
    #[must_use]
    pub fn axial_stiffness(&self) -> f64 {
        self.elastic_modulus * self.area / self.length
    }

    /// Stiffness matrix in the element frame.
    #[must_use]
    pub fn local_stiffness(&self) -> &Matrix4 {
        &self.local_stiffness
    }

    /// Displacement transformation from the global to the element frame.
    #[must_use]
    pub fn transformation(&self) -> &Matrix4 {
        &self.transformation
    }

    /// Stiffness matrix in the global frame, `Tᵗ · K_local · T`.
    #[must_use]
    pub fn stiffness(&self) -> &Matrix4 {
        &self.stiffness
    }

    /// Change in length for the global nodal displacements `u1x, u1y, u2x, u2y`.
    #[must_use]
    pub fn elongation(&self, displacements: &Vector4) -> f64 {
        let local = self.transformation * displacements;
        local[2] - local[0]
    }

    /// Axial force for the global nodal displacements, positive in tension.
    #[must_use]
    pub fn axial_force(&self, displacements: &Vector4) -> f64 {
        self.axial_stiffness() * self.elongation(displacements)
    }

    /// Axial stress for the global nodal displacements, positive in tension.
    #[must_use]
    pub fn axial_stress(&self, displacements: &Vector4) -> f64 {
        self.axial_force(displacements) / self.area
    }

    /// Elongation, force and stress in one pass.
    #[must_use]
    pub fn response(&self, displacements: &Vector4) -> MemberResponse {
        let elongation = self.elongation(displacements);
        let axial_force = self.axial_stiffness() * elongation;
        MemberResponse {
            elongation,
            axial_force,
            axial_stress: axial_force / self.area,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;

    fn link(end: Point) -> Link2D {
        Link2D::new(point(0.0, 0.0, 0.0), end, 200.0e9, 0.01).expect("valid link")
    }

    #[test]
    fn horizontal_link_matches_local_stiffness() {
        let link = link(point(2.0, 0.0, 0.0));
        assert_relative_eq!(link.axial_stiffness(), 1.0e9, max_relative = 1.0e-12);
        assert_relative_eq!(*link.stiffness(), *link.local_stiffness(), epsilon = 1.0e-3);
        assert_relative_eq!(link.stiffness()[(0, 0)], 1.0e9, max_relative = 1.0e-12);
        assert_relative_eq!(link.stiffness()[(0, 2)], -1.0e9, max_relative = 1.0e-12);
        assert_relative_eq!(link.stiffness()[(1, 1)], 0.0);
    }

    #[test]
    fn vertical_link_has_only_y_stiffness() {
        let link = link(point(0.0, 2.0, 0.0));
        let k = link.stiffness();
        assert_relative_eq!(k[(1, 1)], 1.0e9, max_relative = 1.0e-12);
        assert_relative_eq!(k[(1, 3)], -1.0e9, max_relative = 1.0e-12);
        assert!(k[(0, 0)].abs() < 1.0e-3);
    }

    #[test]
    fn diagonal_link_couples_both_axes() {
        let link = link(point(1.0, 1.0, 0.0));
        let k = link.stiffness();
        let expected = link.axial_stiffness() * 0.5;
        let entries = [
            (0, 0, 1.0),
            (0, 1, 1.0),
            (1, 1, 1.0),
            (0, 2, -1.0),
            (1, 3, -1.0),
        ];
        for (row, col, sign) in entries {
            assert_relative_eq!(k[(row, col)], sign * expected, max_relative = 1.0e-12);
        }
    }

    #[test]
    fn angle_resolves_all_quadrants() {
        assert_relative_eq!(link(point(-1.0, 0.0, 0.0)).angle(), std::f64::consts::PI);
        assert_relative_eq!(
            link(point(-1.0, -1.0, 0.0)).angle(),
            -3.0 * std::f64::consts::FRAC_PI_4,
            max_relative = 1.0e-12
        );
        assert_relative_eq!(
            link(point(1.0, -1.0, 0.0)).angle(),
            -std::f64::consts::FRAC_PI_4,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn reversed_link_has_same_global_stiffness() {
        let forward = link(point(1.0, 2.0, 0.0));
        let reversed = Link2D::new(point(1.0, 2.0, 0.0), point(0.0, 0.0, 0.0), 200.0e9, 0.01)
            .expect("valid link");
        let k = forward.stiffness();
        let r = reversed.stiffness();
        // Swapping endpoints swaps the node blocks of the matrix.
        for row in 0..4 {
            for col in 0..4 {
                assert_relative_eq!(
                    k[(row, col)],
                    r[((row + 2) % 4, (col + 2) % 4)],
                    epsilon = 1.0e-3
                );
            }
        }
    }

    #[test]
    fn stiffness_is_symmetric_and_deterministic() {
        let a = link(point(3.0, -7.0, 0.0));
        let b = link(point(3.0, -7.0, 0.0));
        assert_eq!(a, b);
        assert_eq!(a.stiffness(), &a.stiffness().transpose());
    }

    #[test]
    fn stretching_along_axis_gives_tension() {
        let link = link(point(3.0, 4.0, 0.0));
        // Move the far node 1e-3 along the member axis.
        let displacements = Vector4::new(0.0, 0.0, 0.6e-3, 0.8e-3);
        let response = link.response(&displacements);
        assert_relative_eq!(response.elongation, 1.0e-3, max_relative = 1.0e-12);
        assert_relative_eq!(
            response.axial_force,
            200.0e9 * 0.01 / 5.0 * 1.0e-3,
            max_relative = 1.0e-12
        );
        assert_relative_eq!(
            response.axial_stress,
            response.axial_force / 0.01,
            max_relative = 1.0e-12
        );
        assert_relative_eq!(link.axial_stress(&displacements), response.axial_stress);
    }

    #[test]
    fn transverse_motion_does_not_strain_link() {
        let link = link(point(2.0, 0.0, 0.0));
        let displacements = Vector4::new(0.0, 0.0, 0.0, 1.0e-3);
        assert_relative_eq!(link.elongation(&displacements), 0.0);
    }

    #[test]
    fn invalid_links_are_rejected() {
        let origin = point(0.0, 0.0, 0.0);
        assert_eq!(
            Link2D::new(origin, origin, 1.0, 1.0),
            Err(ModelError::CoincidentNodes)
        );
        assert_eq!(
            Link2D::new(origin, point(1.0, 0.0, 1.0), 1.0, 1.0),
            Err(ModelError::OutOfPlane {
                start_z: 0.0,
                end_z: 1.0
            })
        );
        assert_eq!(
            Link2D::new(origin, point(1.0, 0.0, 0.0), 1.0, 0.0),
            Err(ModelError::NonPositiveArea(0.0))
        );
        assert_eq!(
            Link2D::new(origin, point(1.0, 0.0, 0.0), -5.0, 1.0),
            Err(ModelError::NonPositiveElasticModulus(-5.0))
        );
    }

    #[test]
    fn non_finite_geometry_is_rejected() {
        let origin = point(0.0, 0.0, 0.0);
        assert_eq!(
            Link2D::new(origin, point(f64::NAN, 1.0, 0.0), 1.0, 1.0),
            Err(ModelError::NonFiniteGeometry)
        );
        assert_eq!(
            Link2D::new(point(0.0, 0.0, f64::NAN), origin, 1.0, 1.0),
            Err(ModelError::NonFiniteGeometry)
        );
        assert_eq!(
            Link2D::new(origin, point(f64::INFINITY, 0.0, 0.0), 1.0, 1.0),
            Err(ModelError::NonFiniteGeometry)
        );
        // Finite endpoints whose separation overflows.
        assert_eq!(
            Link2D::new(point(-1.0e308, 0.0, 0.0), point(1.0e308, 0.0, 0.0), 1.0, 1.0),
            Err(ModelError::NonFiniteGeometry)
        );
    }

    #[test]
    fn local_dofs_follow_node_then_axis_order() {
        assert_eq!(Link2D::local_dof(0), (0, Dof::X));
        assert_eq!(Link2D::local_dof(1), (0, Dof::Y));
        assert_eq!(Link2D::local_dof(2), (1, Dof::X));
        assert_eq!(Link2D::local_dof(3), (1, Dof::Y));
    }
}
