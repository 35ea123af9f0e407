#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod assembly;
pub mod dof;
pub mod element;
pub mod errors;
pub mod geometry;
pub mod loads;
pub mod material;
pub mod model;
pub mod report;
pub mod solver;

pub use assembly::AssembledSystem;
pub use dof::{assign_dof_indices, Dof, DofIndices, DofSet};
pub use element::{Link2D, MemberResponse};
pub use errors::{ModelError, SolveError, StateError};
pub use geometry::{distance, point, Displacement, Extents, Point};
pub use loads::{DisplacementLoad, ForceLoad, Load, LoadKind};
pub use material::Material;
pub use model::{Element, ElementId, MaterialId, Model, Node, NodeId, ReactionRow};
pub use report::{
    render_member_results, render_nodal_solution, render_reactions, render_summary, Report,
};
pub use solver::{LinearSolver, Solution, Solver, SolverConfig};
