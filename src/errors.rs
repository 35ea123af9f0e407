//! Error types produced while building, solving or querying a model.

use thiserror::Error;

use crate::dof::Dof;
use crate::model::{ElementId, MaterialId, NodeId};

/// Error returned when constructing or editing a [`Model`](crate::Model).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    /// Returned when a node cannot be found in the model.
    #[error("node {0} does not exist in this model")]
    UnknownNode(NodeId),
    /// Returned when an element cannot be found in the model.
    #[error("element {0} does not exist in this model")]
    UnknownElement(ElementId),
    /// Returned when a material cannot be found in the model.
    #[error("material {0} does not exist in this model")]
    UnknownMaterial(MaterialId),
    /// Returned when a node id is already taken.
    #[error("node {0} is already defined")]
    DuplicateNode(NodeId),
    /// Returned when an element id is already taken.
    #[error("element {0} is already defined")]
    DuplicateElement(ElementId),
    /// Returned when the largest id in use leaves no successor.
    #[error("no {0} identifiers left")]
    IdsExhausted(&'static str),
    /// Returned when both endpoints of a link share the same plane position.
    #[error("link endpoints are coincident")]
    CoincidentNodes,
    /// Returned when an endpoint coordinate or the resulting length is NaN or infinite.
    #[error("link geometry is not finite")]
    NonFiniteGeometry,
    /// Returned when the endpoints of a planar link differ in z.
    #[error("link endpoints do not lie in a common XY plane (z = {start_z} and {end_z})")]
    OutOfPlane {
        /// Z coordinate of the first endpoint.
        start_z: f64,
        /// Z coordinate of the second endpoint.
        end_z: f64,
    },
    /// Returned when the cross-sectional area is zero or negative.
    #[error("area must be positive (received {0})")]
    NonPositiveArea(f64),
    /// Returned when the elastic modulus is zero or negative.
    #[error("elastic modulus must be positive (received {0})")]
    NonPositiveElasticModulus(f64),
    /// Returned when a material without an elastic modulus is used by a link.
    #[error("material has no elastic modulus")]
    MissingElasticModulus,
}

/// Error returned when a solve cannot be carried out.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolveError {
    /// Returned when no solution strategy has been assigned to the model.
    #[error("no solver assigned to the model")]
    NoSolver,
    /// Returned when the model has nothing to assemble.
    #[error("model contains no elements")]
    NoElements,
    /// Returned when a load targets a degree of freedom the node does not carry.
    #[error("load on node {node} targets inactive degree of freedom {dof}")]
    InactiveDof {
        /// Node the load is applied to.
        node: NodeId,
        /// Offending degree of freedom.
        dof: Dof,
    },
    /// Returned when solver settings cannot be used.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
    /// Returned when the reduced stiffness matrix cannot be inverted.
    #[error("stiffness matrix is singular ({0}); check supports and connectivity")]
    SingularSystem(String),
}

/// Error returned when querying results that do not exist.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StateError {
    /// Returned when the model has not been solved since its last change.
    #[error("model has not been solved")]
    NotSolved,
    /// Returned when a node cannot be found in the model.
    #[error("node {0} does not exist in this model")]
    UnknownNode(NodeId),
    /// Returned when an element cannot be found in the model.
    #[error("element {0} does not exist in this model")]
    UnknownElement(ElementId),
    /// Returned when a node is not attached to any element and has no solution.
    #[error("node {0} carries no degrees of freedom")]
    NoDegreesOfFreedom(NodeId),
}
