//! Global stiffness assembly and boundary vectors.

use log::{debug, warn};
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::dof::DofIndices;
use crate::element::Link2D;
use crate::errors::SolveError;
use crate::loads::LoadKind;
use crate::model::Model;

/// The global system of one solve, before reduction.
#[derive(Clone, Debug)]
pub struct AssembledSystem {
    /// Number of equations.
    pub size: usize,
    /// Global stiffness matrix.
    pub stiffness: CsrMatrix<f64>,
    /// Prescribed displacement per equation, `None` where the equation is free.
    pub displacements: Vec<Option<f64>>,
    /// Applied external force per equation.
    pub forces: DVector<f64>,
}

/// Map the rows of a link's stiffness matrix onto global equation numbers.
///
/// Row `r` belongs to endpoint `r / 2` and label `r % 2 + 1`; its equation number
/// is read from that endpoint's numbering. Returns `None` when an endpoint lacks
/// one of the labels.
#[must_use]
pub fn element_dof_map(endpoints: [&DofIndices; 2]) -> Option<[usize; 4]> {
    let mut map = [0; 4];
    for (local, slot) in map.iter_mut().enumerate() {
        let (node, dof) = Link2D::local_dof(local);
        *slot = endpoints[node].get(dof)?;
    }
    Some(map)
}

/// Scatter element stiffness matrices into a `size × size` sparse matrix.
///
/// Contributions landing on the same entry are summed, so the result does not
/// depend on the order of `elements` beyond floating-point rounding.
pub fn assemble_stiffness<'a, I>(size: usize, elements: I) -> CsrMatrix<f64>
where
    I: IntoIterator<Item = (&'a Link2D, [usize; 4])>,
{
    let mut triplets = CooMatrix::new(size, size);
    for (link, dofs) in elements {
        let stiffness = link.stiffness();
        for (row, &global_row) in dofs.iter().enumerate() {
            for (col, &global_col) in dofs.iter().enumerate() {
                triplets.push(global_row, global_col, stiffness[(row, col)]);
            }
        }
    }
    CsrMatrix::from(&triplets)
}

/// Build the global system for a model whose degrees of freedom are numbered.
///
/// # Errors
///
/// Returns [`SolveError::InactiveDof`] when a load acts on an axis its node does not
/// carry.
pub fn assemble(model: &Model) -> Result<AssembledSystem, SolveError> {
    let size = model.system_size();
    let mut elements = Vec::with_capacity(model.element_count());
    for element in model.elements() {
        let dofs = model.element_dofs(element).ok_or_else(|| {
            SolveError::InvalidConfig(format!(
                "element {} was not numbered before assembly",
                element.id()
            ))
        })?;
        elements.push((element.link(), dofs));
    }
    let stiffness = assemble_stiffness(size, elements);
    debug!(
        "assembled {size}x{size} stiffness with {} stored entries",
        stiffness.nnz()
    );

    let mut displacements = vec![None; size];
    let mut forces = DVector::zeros(size);
    let mut force_set = vec![false; size];
    for load in model.loads() {
        let node = model
            .node(load.node)
            .ok_or_else(|| SolveError::InvalidConfig(format!("unknown node {}", load.node)))?;
        for dof in load.active_dofs().iter() {
            let equation = node.indices().get(dof).ok_or(SolveError::InactiveDof {
                node: load.node,
                dof,
            })?;
            match &load.kind {
                LoadKind::Displacement(displacement) => {
                    displacements[equation] = displacement.component(dof);
                }
                LoadKind::Force(force) => {
                    if force_set[equation] {
                        warn!(
                            "force on node {} {dof} replaces an earlier force",
                            load.node
                        );
                    }
                    forces[equation] = force.component(dof);
                    force_set[equation] = true;
                }
            }
        }
    }

    Ok(AssembledSystem {
        size,
        stiffness,
        displacements,
        forces,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    use super::*;
    use crate::dof::{assign_dof_indices, Dof, DofSet};
    use crate::geometry::point;
    use crate::loads::{DisplacementLoad, ForceLoad};
    use crate::material::Material;

    fn links() -> Vec<(Link2D, [usize; 4])> {
        let a = point(0.0, 0.0, 0.0);
        let b = point(4.0, 0.0, 0.0);
        let c = point(2.0, 3.0, 0.0);
        vec![
            (Link2D::new(a, b, 10.0, 2.0).expect("valid"), [0, 1, 2, 3]),
            (Link2D::new(b, c, 10.0, 2.0).expect("valid"), [2, 3, 4, 5]),
            (Link2D::new(c, a, 10.0, 2.0).expect("valid"), [4, 5, 0, 1]),
        ]
    }

    #[test]
    fn dof_map_reads_endpoint_numbering() {
        let planar = DofSet::of(&[Dof::X, Dof::Y]);
        let (indices, _) = assign_dof_indices(&[planar, planar, planar]);
        assert_eq!(element_dof_map([&indices[2], &indices[0]]), Some([4, 5, 0, 1]));
        let (partial, _) = assign_dof_indices(&[planar, DofSet::of(&[Dof::X])]);
        assert_eq!(element_dof_map([&partial[0], &partial[1]]), None);
    }

    #[test]
    fn shared_dofs_accumulate() {
        let links = links();
        let global = DMatrix::from(&assemble_stiffness(
            6,
            links.iter().map(|(link, dofs)| (link, *dofs)),
        ));
        let own = links[0].0.stiffness()[(2, 2)] + links[1].0.stiffness()[(0, 0)];
        assert_relative_eq!(global[(2, 2)], own, max_relative = 1.0e-14);
        assert_relative_eq!(global, global.transpose(), epsilon = 1.0e-12);
    }

    #[test]
    fn assembly_is_order_independent() {
        let links = links();
        let forward = DMatrix::from(&assemble_stiffness(
            6,
            links.iter().map(|(link, dofs)| (link, *dofs)),
        ));
        let reversed = DMatrix::from(&assemble_stiffness(
            6,
            links.iter().rev().map(|(link, dofs)| (link, *dofs)),
        ));
        assert_relative_eq!(forward, reversed, epsilon = 1.0e-12);
    }

    #[test]
    fn boundary_vectors_keep_null_and_zero_apart() {
        let mut model = Model::new("vectors");
        let material = model.add_material(Material::linear(1.0)).expect("free id");
        let a = model.add_node(point(0.0, 0.0, 0.0)).expect("free id");
        let b = model.add_node(point(1.0, 0.0, 0.0)).expect("free id");
        model.add_element(a, b, material, 1.0).expect("valid element");
        model
            .add_displacement(a, DisplacementLoad::new(Some(0.0), None, None))
            .expect("known node");
        model
            .add_force(b, ForceLoad::new(1.0, 2.0, 0.0))
            .expect("known node");
        model
            .add_force(b, ForceLoad::new(0.0, 5.0, 0.0))
            .expect("known node");
        model.assign_dof_indices();

        let system = assemble(&model).expect("assembles");
        assert_eq!(system.size, 4);
        assert_eq!(system.displacements, vec![Some(0.0), None, None, None]);
        // Later forces replace earlier ones only on the axes they act on.
        assert_eq!(system.forces.as_slice(), &[0.0, 0.0, 1.0, 5.0]);
    }
}
