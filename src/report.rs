//! Text and JSON reports of a model and its solution.

use std::fmt::Write;

use serde::Serialize;

use crate::dof::Dof;
use crate::element::MemberResponse;
use crate::errors::StateError;
use crate::loads::LoadKind;
use crate::model::{ElementId, Model, NodeId, ReactionRow};

/// Width of the report banners.
const WIDTH: usize = 80;

/// Solved displacement of one node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NodeRow {
    /// Node reported on.
    pub node: NodeId,
    /// Displacement along X.
    pub ux: f64,
    /// Displacement along Y.
    pub uy: f64,
    /// Displacement along Z, zero for nodes without a Z degree of freedom.
    pub uz: f64,
}

/// Recovered response of one member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MemberRow {
    /// Element reported on.
    pub element: ElementId,
    /// Axial response.
    #[serde(flatten)]
    pub response: MemberResponse,
}

/// Everything a solved model reports, ready for serialization.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    /// Name of the model.
    pub model: String,
    /// Nodal displacements, ascending node id.
    pub nodes: Vec<NodeRow>,
    /// Member responses, ascending element id.
    pub members: Vec<MemberRow>,
    /// Support reactions, ascending node id.
    pub reactions: Vec<ReactionRow>,
}

impl Report {
    /// Collect the report of a solved model.
    ///
    /// Nodes without degrees of freedom are left out.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotSolved`] before a successful solve.
    pub fn from_model(model: &Model) -> Result<Self, StateError> {
        Ok(Self {
            model: model.name().to_owned(),
            nodes: node_rows(model)?,
            members: member_rows(model)?,
            reactions: model.reactions()?,
        })
    }

    /// Render the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a value cannot be represented.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Displacement rows of every node that carries degrees of freedom.
fn node_rows(model: &Model) -> Result<Vec<NodeRow>, StateError> {
    let mut rows = Vec::new();
    for node in model.nodes().filter(|node| !node.dofs().is_empty()) {
        let displacement = model.node_displacement(node.id())?;
        rows.push(NodeRow {
            node: node.id(),
            ux: displacement.x,
            uy: displacement.y,
            uz: displacement.z,
        });
    }
    Ok(rows)
}

/// Response rows of every element.
fn member_rows(model: &Model) -> Result<Vec<MemberRow>, StateError> {
    model
        .elements()
        .map(|element| {
            Ok(MemberRow {
                element: element.id(),
                response: model.element_response(element.id())?,
            })
        })
        .collect()
}

/// Centered banner line.
fn banner(output: &mut String, title: &str, fill: char) {
    let title = format!(" {title} ");
    let side = WIDTH.saturating_sub(title.len()) / 2;
    let fill: String = std::iter::repeat(fill).take(side).collect();
    writeln!(output, "{fill}{title}{fill}").expect("writing to string cannot fail");
}

/// Format an optional value, `-` when absent.
fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |value| format!("{value:+.6e}"))
}

/// Render node and element counts, loads and materials.
#[must_use]
pub fn render_summary(model: &Model) -> String {
    let mut output = String::new();
    banner(&mut output, &format!("MODEL SUMMARY {}", model.name()), '*');

    banner(&mut output, "Mesh", '-');
    writeln!(output, "Nodes     {}", model.node_count()).expect("writing to string cannot fail");
    writeln!(output, "Elements  {}", model.element_count())
        .expect("writing to string cannot fail");

    banner(&mut output, "Loads", '-');
    for load in model.loads() {
        let description = match &load.kind {
            LoadKind::Force(force) => {
                format!("Force: ({}, {}, {})", force.x, force.y, force.z)
            }
            LoadKind::Displacement(displacement) => {
                let component = |dof| {
                    displacement
                        .component(dof)
                        .map_or_else(|| "free".to_owned(), |value: f64| value.to_string())
                };
                format!(
                    "Displacement: ({}, {}, {})",
                    component(Dof::X),
                    component(Dof::Y),
                    component(Dof::Z)
                )
            }
        };
        writeln!(output, "Node {:<6}{description}", load.node)
            .expect("writing to string cannot fail");
    }

    banner(&mut output, "Materials", '-');
    for (id, material) in model.materials() {
        writeln!(output, "Material {id}").expect("writing to string cannot fail");
        for (label, value) in material.properties() {
            writeln!(output, "  {label:<4}{value}").expect("writing to string cannot fail");
        }
    }

    banner(&mut output, "END MODEL SUMMARY", '*');
    output
}

/// Render the nodal displacement table.
///
/// # Errors
///
/// Returns [`StateError::NotSolved`] before a successful solve.
pub fn render_nodal_solution(model: &Model) -> Result<String, StateError> {
    let mut output = String::from("Nodal Displacement Solution\n\n");
    writeln!(output, "{:>6} | {:>14} | {:>14} | {:>14}", "Node", "ux", "uy", "uz")
        .expect("writing to string cannot fail");
    for row in node_rows(model)? {
        writeln!(
            output,
            "{:>6} | {:>+14.6e} | {:>+14.6e} | {:>+14.6e}",
            row.node, row.ux, row.uy, row.uz
        )
        .expect("writing to string cannot fail");
    }
    Ok(output)
}

/// Render the support reaction table, `-` where an axis is not constrained.
///
/// # Errors
///
/// Returns [`StateError::NotSolved`] before a successful solve.
pub fn render_reactions(model: &Model) -> Result<String, StateError> {
    let mut output = String::from("Nodal Force Reaction Solution\n\n");
    writeln!(output, "{:>6} | {:>14} | {:>14} | {:>14}", "Node", "Fx", "Fy", "Fz")
        .expect("writing to string cannot fail");
    for row in model.reactions()? {
        writeln!(
            output,
            "{:>6} | {:>14} | {:>14} | {:>14}",
            row.node,
            optional(row.fx),
            optional(row.fy),
            optional(row.fz)
        )
        .expect("writing to string cannot fail");
    }
    Ok(output)
}

/// Render elongation, axial force and axial stress per element.
///
/// # Errors
///
/// Returns [`StateError::NotSolved`] before a successful solve.
pub fn render_member_results(model: &Model) -> Result<String, StateError> {
    let mut output = String::from("Element Axial Solution\n\n");
    writeln!(
        output,
        "{:>7} | {:>14} | {:>14} | {:>14}",
        "Element", "elongation", "force", "stress"
    )
    .expect("writing to string cannot fail");
    for row in member_rows(model)? {
        writeln!(
            output,
            "{:>7} | {:>+14.6e} | {:>+14.6e} | {:>+14.6e}",
            row.element,
            row.response.elongation,
            row.response.axial_force,
            row.response.axial_stress
        )
        .expect("writing to string cannot fail");
    }
    Ok(output)
}
