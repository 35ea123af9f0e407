//! The model context: nodes, elements, materials, loads and solve results.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, trace};
use nalgebra_sparse::CsrMatrix;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::assembly::{self, element_dof_map};
use crate::dof::{assign_dof_indices, Dof, DofIndices, DofSet};
use crate::element::{Link2D, MemberResponse, Vector4};
use crate::errors::{ModelError, SolveError, StateError};
use crate::geometry::{Displacement, Extents, Point};
use crate::loads::{DisplacementLoad, ForceLoad, Load, LoadKind};
use crate::material::Material;
use crate::solver::{Solution, Solver};

/// Identifier of a node, unique within a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Identifier of an element, unique within a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

/// Identifier of a material, unique within a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A node of the mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Identifier of the node.
    id: NodeId,
    /// Position in the global frame.
    position: Point,
    /// Degrees of freedom contributed by attached elements.
    dofs: DofSet,
    /// Global equation numbers from the latest assignment pass.
    indices: DofIndices,
    /// Solved displacement per label.
    solution: [Option<f64>; 3],
}

impl Node {
    /// Create an unattached node.
    fn new(id: NodeId, position: Point) -> Self {
        Self {
            id,
            position,
            dofs: DofSet::EMPTY,
            indices: DofIndices::default(),
            solution: [None; 3],
        }
    }

    /// Identifier of the node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Position in the global frame.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Degrees of freedom the node carries, empty until assignment.
    #[must_use]
    pub fn dofs(&self) -> DofSet {
        self.dofs
    }

    /// Global equation numbers, empty until assignment.
    #[must_use]
    pub fn indices(&self) -> &DofIndices {
        &self.indices
    }

    /// Solved displacement along `dof`, if the model has been solved.
    #[must_use]
    pub fn solution(&self, dof: Dof) -> Option<f64> {
        self.solution[dof.index()]
    }
}

/// An axial link bound to two nodes and a material.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Identifier of the element.
    id: ElementId,
    /// First and second endpoint.
    nodes: [NodeId; 2],
    /// Material the element is made of.
    material: MaterialId,
    /// Stiffness and recovery kernel.
    link: Link2D,
}

impl Element {
    /// Identifier of the element.
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// First and second endpoint.
    #[must_use]
    pub fn nodes(&self) -> [NodeId; 2] {
        self.nodes
    }

    /// Material the element is made of.
    #[must_use]
    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Stiffness and recovery kernel.
    #[must_use]
    pub fn link(&self) -> &Link2D {
        &self.link
    }
}

/// Support reactions at a constrained node.
///
/// An axis is `None` when none of the node's displacement loads prescribes it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ReactionRow {
    /// Constrained node.
    pub node: NodeId,
    /// Reaction along the global X axis.
    pub fx: Option<f64>,
    /// Reaction along the global Y axis.
    pub fy: Option<f64>,
    /// Reaction along the global Z axis.
    pub fz: Option<f64>,
}

impl ReactionRow {
    /// Reaction along `dof`.
    #[must_use]
    pub fn component(&self, dof: Dof) -> Option<f64> {
        match dof {
            Dof::X => self.fx,
            Dof::Y => self.fy,
            Dof::Z => self.fz,
        }
    }
}

/// State produced by one successful solve.
#[derive(Clone, Debug)]
struct Results {
    /// Assembled global stiffness.
    stiffness: CsrMatrix<f64>,
    /// Full displacement and force vectors.
    solution: Solution,
    /// Recovered member quantities.
    members: BTreeMap<ElementId, MemberResponse>,
}

/// A finite element model of a planar link structure.
///
/// The model owns every node, element and material and hands out lightweight
/// identifiers for them. Identifiers are assigned sequentially as "largest so far
/// plus one", starting from `1`. Any change to the structure or loads discards
/// previous results.
///
/// # Examples
/// ```
/// use trussfea::{point, DisplacementLoad, ForceLoad, LinearSolver, Material, Model};
///
/// let mut model = Model::new("bar");
/// let steel = model.add_material(Material::linear(200.0e9)).unwrap();
/// let a = model.add_node(point(0.0, 0.0, 0.0)).unwrap();
/// let b = model.add_node(point(1.0, 0.0, 0.0)).unwrap();
/// let bar = model.add_element(a, b, steel, 0.01).unwrap();
/// model.add_displacement(a, DisplacementLoad::pinned()).unwrap();
/// model.add_displacement(b, DisplacementLoad::roller_y()).unwrap();
/// model.add_force(b, ForceLoad::new(1_000.0, 0.0, 0.0)).unwrap();
/// model.set_solver(LinearSolver::default());
/// model.solve().unwrap();
///
/// assert!((model.element_axial_force(bar).unwrap() - 1_000.0).abs() < 1.0e-6);
/// ```
#[derive(Debug, Default)]
pub struct Model {
    /// Descriptive name.
    name: String,
    /// Nodes as graph vertices, elements as graph edges.
    graph: StableGraph<Node, Element>,
    /// Node lookup in ascending id order.
    nodes: BTreeMap<NodeId, NodeIndex>,
    /// Element lookup in ascending id order.
    elements: BTreeMap<ElementId, EdgeIndex>,
    /// Materials by id.
    materials: BTreeMap<MaterialId, Material>,
    /// Loads in registration order.
    loads: Vec<Load>,
    /// Strategy used by [`Model::solve`].
    solver: Option<Box<dyn Solver>>,
    /// Size of the global system from the latest assignment pass.
    system_size: usize,
    /// Results of the latest successful solve.
    results: Option<Results>,
}

impl Model {
    /// Create an empty model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Descriptive name of the model.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a material.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IdsExhausted`] when the largest material id is `u32::MAX`.
    pub fn add_material(&mut self, material: Material) -> Result<MaterialId, ModelError> {
        let last = self.materials.keys().next_back().map(|id| id.0);
        let id = MaterialId(next_id(last, "material")?);
        self.materials.insert(id, material);
        Ok(id)
    }

    /// Look up a material.
    #[must_use]
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// Materials in ascending id order.
    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter().map(|(id, material)| (*id, material))
    }

    /// Add a node with the next free id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IdsExhausted`] when the largest node id is `u32::MAX`.
    pub fn add_node(&mut self, position: Point) -> Result<NodeId, ModelError> {
        let last = self.nodes.keys().next_back().map(|id| id.0);
        let id = NodeId(next_id(last, "node")?);
        self.insert_node(id, position);
        Ok(id)
    }

    /// Add a node with a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateNode`] when `id` is already in use.
    pub fn add_node_with_id(&mut self, id: NodeId, position: Point) -> Result<NodeId, ModelError> {
        if self.nodes.contains_key(&id) {
            return Err(ModelError::DuplicateNode(id));
        }
        self.insert_node(id, position);
        Ok(id)
    }

    /// Insert a node that is known not to exist yet.
    fn insert_node(&mut self, id: NodeId, position: Point) {
        self.invalidate();
        let index = self.graph.add_node(Node::new(id, position));
        self.nodes.insert(id, index);
    }

    /// Connect two nodes with an axial link.
    ///
    /// The link's stiffness is computed here, so geometric and material problems
    /// surface immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] or [`ModelError::UnknownMaterial`] for ids
    /// that are not part of this model, [`ModelError::MissingElasticModulus`] when the
    /// material has no modulus, [`ModelError::IdsExhausted`] when the largest element
    /// id is `u32::MAX`, and the construction errors of [`Link2D::new`].
    pub fn add_element(
        &mut self,
        start: NodeId,
        end: NodeId,
        material: MaterialId,
        area: f64,
    ) -> Result<ElementId, ModelError> {
        let last = self.elements.keys().next_back().map(|id| id.0);
        let id = ElementId(next_id(last, "element")?);
        self.insert_element(id, start, end, material, area)
    }

    /// Connect two nodes with an axial link under a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateElement`] when `id` is already in use, and the
    /// errors of [`Model::add_element`] otherwise.
    pub fn add_element_with_id(
        &mut self,
        id: ElementId,
        start: NodeId,
        end: NodeId,
        material: MaterialId,
        area: f64,
    ) -> Result<ElementId, ModelError> {
        if self.elements.contains_key(&id) {
            return Err(ModelError::DuplicateElement(id));
        }
        self.insert_element(id, start, end, material, area)
    }

    /// Build a link and insert it as an edge under an id known to be free.
    fn insert_element(
        &mut self,
        id: ElementId,
        start: NodeId,
        end: NodeId,
        material: MaterialId,
        area: f64,
    ) -> Result<ElementId, ModelError> {
        let start_index = self.node_index(start)?;
        let end_index = self.node_index(end)?;
        let elastic_modulus = self
            .materials
            .get(&material)
            .ok_or(ModelError::UnknownMaterial(material))?
            .elastic_modulus()?;
        let link = Link2D::new(
            self.graph[start_index].position,
            self.graph[end_index].position,
            elastic_modulus,
            area,
        )?;

        self.invalidate();
        let edge = self.graph.add_edge(
            start_index,
            end_index,
            Element {
                id,
                nodes: [start, end],
                material,
                link,
            },
        );
        self.elements.insert(id, edge);
        trace!("added element {id} between nodes {start} and {end}");
        Ok(id)
    }

    /// Remove an element. Its nodes stay in the model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownElement`] when `id` is not part of this model.
    pub fn remove_element(&mut self, id: ElementId) -> Result<(), ModelError> {
        let edge = self
            .elements
            .remove(&id)
            .ok_or(ModelError::UnknownElement(id))?;
        self.invalidate();
        self.graph.remove_edge(edge);
        Ok(())
    }

    /// Apply a point force to a node.
    ///
    /// When several forces act on the same degree of freedom the last one
    /// registered replaces the earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] when `node` is not part of this model.
    pub fn add_force(&mut self, node: NodeId, force: ForceLoad) -> Result<(), ModelError> {
        self.add_load(node, LoadKind::Force(force))
    }

    /// Prescribe displacements at a node.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] when `node` is not part of this model.
    pub fn add_displacement(
        &mut self,
        node: NodeId,
        displacement: DisplacementLoad,
    ) -> Result<(), ModelError> {
        self.add_load(node, LoadKind::Displacement(displacement))
    }

    /// Register a load of either kind.
    fn add_load(&mut self, node: NodeId, kind: LoadKind) -> Result<(), ModelError> {
        self.node_index(node)?;
        self.invalidate();
        self.loads.push(Load { node, kind });
        Ok(())
    }

    /// Select the strategy used by [`Model::solve`].
    pub fn set_solver(&mut self, solver: impl Solver + 'static) {
        self.invalidate();
        self.solver = Some(Box::new(solver));
    }

    /// The selected solution strategy.
    #[must_use]
    pub fn solver(&self) -> Option<&dyn Solver> {
        self.solver.as_deref()
    }

    /// Number of nodes, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).map(|&index| &self.graph[index])
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(|&index| &self.graph[index])
    }

    /// Look up an element.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id).map(|&edge| &self.graph[edge])
    }

    /// Elements in ascending id order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values().map(|&edge| &self.graph[edge])
    }

    /// Elements attached to a node, in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] when `node` is not part of this model.
    pub fn elements_at(&self, node: NodeId) -> Result<Vec<ElementId>, ModelError> {
        let index = self.node_index(node)?;
        let mut attached: Vec<ElementId> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|edge| edge.weight().id)
            .collect();
        attached.sort_unstable();
        attached.dedup();
        Ok(attached)
    }

    /// Loads in registration order.
    pub fn loads(&self) -> impl Iterator<Item = &Load> {
        self.loads.iter()
    }

    /// Point forces in registration order.
    pub fn forces(&self) -> impl Iterator<Item = (NodeId, &ForceLoad)> {
        self.loads
            .iter()
            .filter_map(|load| load.as_force().map(|force| (load.node, force)))
    }

    /// Prescribed displacements in registration order.
    pub fn displacements(&self) -> impl Iterator<Item = (NodeId, &DisplacementLoad)> {
        self.loads.iter().filter_map(|load| {
            load.as_displacement()
                .map(|displacement| (load.node, displacement))
        })
    }

    /// Nodes carrying at least one displacement load, in ascending id order.
    #[must_use]
    pub fn constrained_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.displacements().map(|(node, _)| node).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Bounding box of all nodes, `None` for a model without nodes.
    #[must_use]
    pub fn extents(&self) -> Option<Extents> {
        Extents::of(self.nodes().map(Node::position))
    }

    /// Size of the global system from the latest degree-of-freedom assignment.
    #[must_use]
    pub fn system_size(&self) -> usize {
        self.system_size
    }

    /// Number every active degree of freedom and return the system size.
    ///
    /// A node's active set is the union of the sets contributed by its attached
    /// elements, so unattached nodes take no equations. Each pass rebuilds every
    /// node's set and numbering from scratch.
    pub fn assign_dof_indices(&mut self) -> usize {
        let order: Vec<NodeIndex> = self.nodes.values().copied().collect();
        let dof_sets: Vec<DofSet> = order
            .iter()
            .map(|&index| {
                self.graph
                    .edges_directed(index, Direction::Outgoing)
                    .chain(self.graph.edges_directed(index, Direction::Incoming))
                    .fold(DofSet::EMPTY, |dofs, _| dofs.union(Link2D::dof_set()))
            })
            .collect();
        let (indices, size) = assign_dof_indices(&dof_sets);
        for ((index, dofs), numbering) in order.into_iter().zip(dof_sets).zip(indices) {
            let node = &mut self.graph[index];
            node.dofs = dofs;
            node.indices = numbering;
        }
        self.system_size = size;
        debug!(
            "assigned {size} degrees of freedom over {} nodes",
            self.nodes.len()
        );
        size
    }

    /// Global equation numbers of an element's four degrees of freedom.
    pub(crate) fn element_dofs(&self, element: &Element) -> Option<[usize; 4]> {
        let [start, end] = element.nodes;
        element_dof_map([self.node(start)?.indices(), self.node(end)?.indices()])
    }

    /// Assemble and solve the model, storing the results.
    ///
    /// Degree-of-freedom assignment, assembly, reduction, solution and recovery run
    /// in sequence. On failure the model is left without results.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::NoSolver`] when no strategy was selected,
    /// [`SolveError::NoElements`] for an empty model, [`SolveError::InactiveDof`] when a
    /// load targets an axis its node does not carry, and
    /// [`SolveError::SingularSystem`] when the structure is insufficiently restrained.
    pub fn solve(&mut self) -> Result<(), SolveError> {
        if self.solver.is_none() {
            return Err(SolveError::NoSolver);
        }
        if self.elements.is_empty() {
            return Err(SolveError::NoElements);
        }
        self.clear_results();
        self.assign_dof_indices();

        let system = assembly::assemble(self)?;
        let solver = self.solver.as_deref().ok_or(SolveError::NoSolver)?;
        debug!(
            "solving model '{}' with {} ({} equations)",
            self.name,
            solver.name(),
            system.size
        );
        let solution = solver.solve(&system)?;
        self.store_results(system.stiffness, solution);
        Ok(())
    }

    /// Write a solution back onto the nodes and recover member quantities.
    fn store_results(&mut self, stiffness: CsrMatrix<f64>, solution: Solution) {
        for &index in self.nodes.values() {
            let node = &mut self.graph[index];
            let mut values = [None; 3];
            for (dof, equation) in node.indices.iter() {
                values[dof.index()] = Some(solution.displacements()[equation]);
            }
            node.solution = values;
        }

        let mut members = BTreeMap::new();
        for element in self.elements() {
            if let Some(dofs) = self.element_dofs(element) {
                let displacements = Vector4::from_fn(|row, _| solution.displacements()[dofs[row]]);
                members.insert(element.id, element.link.response(&displacements));
            }
        }

        self.results = Some(Results {
            stiffness,
            solution,
            members,
        });
    }

    /// Whether results from a successful solve are available.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.results.is_some()
    }

    /// Full displacement and force vectors of the latest solve.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotSolved`] before a successful solve.
    pub fn solution(&self) -> Result<&Solution, StateError> {
        Ok(&self.results()?.solution)
    }

    /// Assembled global stiffness of the latest solve.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotSolved`] before a successful solve.
    pub fn global_stiffness(&self) -> Result<&CsrMatrix<f64>, StateError> {
        Ok(&self.results()?.stiffness)
    }

    /// Solved displacement of a node; axes the node does not carry read as zero.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotSolved`] before a successful solve,
    /// [`StateError::UnknownNode`] for foreign ids and
    /// [`StateError::NoDegreesOfFreedom`] for nodes without attached elements.
    pub fn node_displacement(&self, id: NodeId) -> Result<Displacement, StateError> {
        self.results()?;
        let node = self.node(id).ok_or(StateError::UnknownNode(id))?;
        if node.dofs.is_empty() {
            return Err(StateError::NoDegreesOfFreedom(id));
        }
        let value = |dof| node.solution(dof).unwrap_or(0.0);
        Ok(Displacement::new(
            value(Dof::X),
            value(Dof::Y),
            value(Dof::Z),
        ))
    }

    /// Elongation, axial force and axial stress of an element.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotSolved`] before a successful solve and
    /// [`StateError::UnknownElement`] for foreign ids.
    pub fn element_response(&self, id: ElementId) -> Result<MemberResponse, StateError> {
        self.results()?
            .members
            .get(&id)
            .copied()
            .ok_or(StateError::UnknownElement(id))
    }

    /// Change in length of an element, positive in tension.
    ///
    /// # Errors
    ///
    /// See [`Model::element_response`].
    pub fn element_elongation(&self, id: ElementId) -> Result<f64, StateError> {
        Ok(self.element_response(id)?.elongation)
    }

    /// Axial force in an element, positive in tension.
    ///
    /// # Errors
    ///
    /// See [`Model::element_response`].
    pub fn element_axial_force(&self, id: ElementId) -> Result<f64, StateError> {
        Ok(self.element_response(id)?.axial_force)
    }

    /// Axial stress in an element, positive in tension.
    ///
    /// # Errors
    ///
    /// See [`Model::element_response`].
    pub fn element_axial_stress(&self, id: ElementId) -> Result<f64, StateError> {
        Ok(self.element_response(id)?.axial_stress)
    }

    /// Support reactions of every constrained node, in ascending node order.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotSolved`] before a successful solve.
    pub fn reactions(&self) -> Result<Vec<ReactionRow>, StateError> {
        let forces = self.results()?.solution.forces();
        let rows = self
            .constrained_nodes()
            .into_iter()
            .filter_map(|id| {
                let node = self.node(id)?;
                let prescribed = self
                    .displacements()
                    .filter(|(target, _)| *target == id)
                    .fold(DofSet::EMPTY, |dofs, (_, displacement)| {
                        dofs.union(displacement.active_dofs())
                    });
                let reaction = |dof: Dof| {
                    prescribed
                        .contains(dof)
                        .then(|| node.indices.get(dof))
                        .flatten()
                        .map(|equation| forces[equation])
                };
                Some(ReactionRow {
                    node: id,
                    fx: reaction(Dof::X),
                    fy: reaction(Dof::Y),
                    fz: reaction(Dof::Z),
                })
            })
            .collect();
        Ok(rows)
    }

    /// Results of the latest successful solve.
    fn results(&self) -> Result<&Results, StateError> {
        self.results.as_ref().ok_or(StateError::NotSolved)
    }

    /// Graph index of a node.
    fn node_index(&self, id: NodeId) -> Result<NodeIndex, ModelError> {
        self.nodes
            .get(&id)
            .copied()
            .ok_or(ModelError::UnknownNode(id))
    }

    /// Discard results after a change to the model.
    fn invalidate(&mut self) {
        if self.results.is_some() {
            self.clear_results();
        }
    }

    /// Drop stored results and per-node solution records.
    fn clear_results(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.solution = [None; 3];
        }
        self.results = None;
    }
}

/// Successor of the largest id in use, `1` for an empty table.
fn next_id(last: Option<u32>, kind: &'static str) -> Result<u32, ModelError> {
    match last {
        None => Ok(1),
        Some(last) => last.checked_add(1).ok_or(ModelError::IdsExhausted(kind)),
    }
}
