#![warn(clippy::pedantic)]

use approx::assert_relative_eq;
use nalgebra::Vector2;
use trussfea::{
    point, Dof, DisplacementLoad, ForceLoad, LinearSolver, Material, Model, NodeId, SolveError,
};

const ELASTIC_MODULUS: f64 = 200.0e9;
const AREA: f64 = 0.01;

/// Triangle with a pin at `a`, a roller on Y at `b` and the apex `c` free.
fn triangle() -> (Model, [NodeId; 3]) {
    let mut model = Model::new("triangle");
    let steel = model.add_material(Material::linear(ELASTIC_MODULUS)).expect("free id");
    let a = model.add_node(point(0.0, 0.0, 0.0)).expect("free id");
    let b = model.add_node(point(4.0, 0.0, 0.0)).expect("free id");
    let c = model.add_node(point(2.0, 3.0, 0.0)).expect("free id");
    for (start, end) in [(a, b), (b, c), (c, a)] {
        model
            .add_element(start, end, steel, AREA)
            .expect("triangle members are valid");
    }
    model.set_solver(LinearSolver::default());
    (model, [a, b, c])
}

/// Largest out-of-balance force over all nodes, summing member forces, applied
/// forces and reactions.
fn largest_imbalance(model: &Model) -> f64 {
    let reactions = model.reactions().expect("solved");
    model
        .nodes()
        .map(|node| {
            let mut sum = Vector2::zeros();
            for id in model.elements_at(node.id()).expect("known node") {
                let element = model.element(id).expect("known element");
                let [start, end] = element.nodes();
                let other = if start == node.id() { end } else { start };
                let towards = model.node(other).expect("known node").position().to_vector()
                    - node.position().to_vector();
                let direction = Vector2::new(towards.x, towards.y) / element.link().length();
                sum += direction * model.element_axial_force(id).expect("solved");
            }
            for (target, force) in model.forces() {
                if target == node.id() {
                    sum += Vector2::new(force.x, force.y);
                }
            }
            if let Some(row) = reactions.iter().find(|row| row.node == node.id()) {
                sum += Vector2::new(row.fx.unwrap_or(0.0), row.fy.unwrap_or(0.0));
            }
            sum.amax()
        })
        .fold(0.0, f64::max)
}

#[test]
fn triangle_with_pin_and_roller_is_in_equilibrium() {
    let (mut model, [a, b, c]) = triangle();
    model
        .add_displacement(a, DisplacementLoad::pinned())
        .expect("known node");
    model
        .add_displacement(b, DisplacementLoad::roller_y())
        .expect("known node");
    model
        .add_force(c, ForceLoad::new(1_000.0, 0.0, 0.0))
        .expect("known node");
    model.solve().expect("pin and roller restrain the triangle");

    assert!(largest_imbalance(&model) < 1.0e-6);

    let reactions = model.reactions().expect("solved");
    assert_relative_eq!(reactions[0].fx.expect("pinned"), -1_000.0, max_relative = 1.0e-9);
    assert_relative_eq!(reactions[0].fy.expect("pinned"), -750.0, max_relative = 1.0e-9);
    assert_eq!(reactions[1].fx, None);
    assert_relative_eq!(reactions[1].fy.expect("roller"), 750.0, max_relative = 1.0e-9);
}

#[test]
fn explicit_zero_constraint_is_prescribed() {
    let (mut model, [a, b, c]) = triangle();
    model
        .add_displacement(a, DisplacementLoad::pinned())
        .expect("known node");
    model
        .add_displacement(b, DisplacementLoad::new(None, Some(0.0), None))
        .expect("known node");
    model
        .add_force(c, ForceLoad::new(1_000.0, 0.0, 0.0))
        .expect("known node");
    model.solve().expect("zero-valued constraint restrains the roller");

    let roller_y = model
        .node(b)
        .expect("known node")
        .indices()
        .get(Dof::Y)
        .expect("roller carries Y");
    let solution = model.solution().expect("solved");
    assert!(solution.prescribed_dofs().contains(&roller_y));
    assert!(!solution.free_dofs().contains(&roller_y));
    assert_eq!(solution.displacements()[roller_y], 0.0);

    let row = model
        .reactions()
        .expect("solved")
        .into_iter()
        .find(|row| row.node == b)
        .expect("roller is reported");
    assert!(row.fy.is_some());
    assert!(row.fx.is_none());
}

#[test]
fn missing_roller_leaves_a_mechanism() {
    let (mut model, [a, _, c]) = triangle();
    model
        .add_displacement(a, DisplacementLoad::pinned())
        .expect("known node");
    model
        .add_force(c, ForceLoad::new(1_000.0, 0.0, 0.0))
        .expect("known node");
    assert!(matches!(model.solve(), Err(SolveError::SingularSystem(_))));
    assert!(!model.is_solved());
}

#[test]
fn unsupported_element_is_singular() {
    let mut model = Model::new("floating");
    let steel = model.add_material(Material::linear(ELASTIC_MODULUS)).expect("free id");
    let a = model.add_node(point(0.0, 0.0, 0.0)).expect("free id");
    let b = model.add_node(point(1.0, 0.0, 0.0)).expect("free id");
    model.add_element(a, b, steel, AREA).expect("valid element");
    model
        .add_force(b, ForceLoad::new(1_000.0, 0.0, 0.0))
        .expect("known node");
    model.set_solver(LinearSolver::default());

    assert!(matches!(model.solve(), Err(SolveError::SingularSystem(_))));
    assert!(model.reactions().is_err());
}

#[test]
fn support_settlement_reproduces_prescribed_values() {
    let (mut model, [a, b, c]) = triangle();
    let settlement = 0.002;
    model
        .add_displacement(a, DisplacementLoad::pinned())
        .expect("known node");
    model
        .add_displacement(b, DisplacementLoad::new(Some(settlement), Some(0.0), None))
        .expect("known node");
    model.solve().expect("both supports are pinned");

    let moved = model.node_displacement(b).expect("solved");
    assert_eq!(moved.x, settlement);
    assert_eq!(moved.y, 0.0);

    let solution = model.solution().expect("solved");
    let scale = solution.forces().amax();
    assert!(scale > 0.0);
    for &equation in solution.free_dofs() {
        assert!(solution.forces()[equation].abs() < 1.0e-9 * scale);
    }

    // The apex hangs off the stretched base without straining its own members.
    let expected = ELASTIC_MODULUS * AREA / 4.0 * settlement;
    let reactions = model.reactions().expect("solved");
    assert_relative_eq!(reactions[0].fx.expect("pinned"), -expected, max_relative = 1.0e-9);
    assert_relative_eq!(reactions[1].fx.expect("pinned"), expected, max_relative = 1.0e-9);
    assert!(model.node_displacement(c).expect("solved").x > 0.0);
}

#[test]
fn prescribing_a_solved_displacement_recovers_the_load() {
    let (mut model, [a, b, c]) = triangle();
    model
        .add_displacement(a, DisplacementLoad::pinned())
        .expect("known node");
    model
        .add_displacement(b, DisplacementLoad::roller_y())
        .expect("known node");
    model
        .add_force(c, ForceLoad::new(1_000.0, -500.0, 0.0))
        .expect("known node");
    model.solve().expect("pin and roller restrain the triangle");
    let apex = model.node_displacement(c).expect("solved");

    let (mut replay, [a, b, c]) = triangle();
    replay
        .add_displacement(a, DisplacementLoad::pinned())
        .expect("known node");
    replay
        .add_displacement(b, DisplacementLoad::roller_y())
        .expect("known node");
    replay
        .add_displacement(c, DisplacementLoad::new(Some(apex.x), Some(apex.y), None))
        .expect("known node");
    replay.solve().expect("fully restrained");

    let row = replay
        .reactions()
        .expect("solved")
        .into_iter()
        .find(|row| row.node == c)
        .expect("apex is reported");
    assert_relative_eq!(row.fx.expect("prescribed"), 1_000.0, max_relative = 1.0e-6);
    assert_relative_eq!(row.fy.expect("prescribed"), -500.0, max_relative = 1.0e-6);
}
