//! Deflection of a hinged support (VM4).
//!
//! Two equal links hang from pinned supports and meet at an apex carrying a
//! downward point load. The apex deflection and the member stress are compared
//! with the closed-form answer.

use std::error::Error;

use log::info;
use trussfea::{
    point, render_member_results, render_nodal_solution, render_reactions, render_summary,
    DisplacementLoad, ElementId, ForceLoad, LinearSolver, Material, Model, NodeId,
};

/// Member length in inches.
const LENGTH: f64 = 15.0 * 12.0;
/// Inclination of both members below the horizontal, in degrees.
const THETA: f64 = 30.0;
/// Cross-sectional area in square inches.
const AREA: f64 = 0.5;
/// Applied load in pounds force.
const FORCE: f64 = 5_000.0;
/// Elastic modulus in psi.
const ELASTIC_MODULUS: f64 = 30.0e6;

/// Published apex deflection in inches.
const TARGET_DEFLECTION: f64 = -0.120;
/// Published member stress in psi.
const TARGET_STRESS: f64 = 10_000.0;

/// Handles to the parts of the model the comparison reads.
struct Vm4 {
    model: Model,
    apex: NodeId,
    member: ElementId,
}

fn build() -> Result<Vm4, Box<dyn Error>> {
    let span = 2.0 * LENGTH * THETA.to_radians().cos();
    let depth = LENGTH * THETA.to_radians().sin();

    let mut model = Model::new("VM4");
    let material = model.add_material(Material::linear(ELASTIC_MODULUS))?;

    let left = model.add_node(point(0.0, 0.0, 0.0))?;
    let apex = model.add_node(point(span / 2.0, -depth, 0.0))?;
    let right = model.add_node(point(span, 0.0, 0.0))?;

    let member = model.add_element(left, apex, material, AREA)?;
    model.add_element(apex, right, material, AREA)?;

    model.add_force(apex, ForceLoad::new(0.0, -FORCE, 0.0))?;
    model.add_displacement(left, DisplacementLoad::pinned())?;
    model.add_displacement(right, DisplacementLoad::pinned())?;

    Ok(Vm4 {
        model,
        apex,
        member,
    })
}

/// Print one result next to its target.
fn compare(label: &str, value: f64, target: f64) {
    let ratio = value / target;
    println!("{label:<20}{value:>14.6}{target:>14.6}{ratio:>10.4}");
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let Vm4 {
        mut model,
        apex,
        member,
    } = build()?;
    print!("{}", render_summary(&model));

    model.set_solver(LinearSolver::default());
    model.solve()?;
    info!("solved {} equations", model.system_size());

    println!();
    println!("{}", render_nodal_solution(&model)?);
    println!("{}", render_reactions(&model)?);
    println!("{}", render_member_results(&model)?);

    println!("{:<20}{:>14}{:>14}{:>10}", "Result", "Computed", "Target", "Ratio");
    compare(
        "Apex deflection",
        model.node_displacement(apex)?.y,
        TARGET_DEFLECTION,
    );
    compare(
        "Member stress",
        model.element_axial_stress(member)?,
        TARGET_STRESS,
    );
    Ok(())
}
