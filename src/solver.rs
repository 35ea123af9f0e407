//! Boundary-condition reduction and the linear static solve.

use std::fmt;

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::assembly::AssembledSystem;
use crate::errors::SolveError;

/// A strategy turning an assembled system into a full solution.
pub trait Solver: fmt::Debug {
    /// Human readable name of the strategy.
    fn name(&self) -> &str;

    /// Solve `system` for the full displacement and force vectors.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::SingularSystem`] when the free degrees of freedom cannot
    /// be determined.
    fn solve(&self, system: &AssembledSystem) -> Result<Solution, SolveError>;
}

/// Numerical settings of [`LinearSolver`].
///
/// Every field falls back to its default when omitted from a serialized record.
///
/// # Examples
/// ```
/// use trussfea::SolverConfig;
///
/// let config = SolverConfig::from_json(r#"{"pivot_tolerance": 0.5}"#).unwrap();
/// assert_eq!(config.pivot_tolerance, 0.5);
/// assert_eq!(config.residual_tolerance, SolverConfig::default().residual_tolerance);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Smallest accepted ratio between the smallest and largest pivot of the
    /// reduced stiffness matrix.
    pub pivot_tolerance: f64,
    /// Largest accepted mismatch between recovered and applied forces at free
    /// degrees of freedom, relative to the largest force in the system.
    pub residual_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1.0e-12,
            residual_tolerance: 1.0e-8,
        }
    }
}

impl SolverConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::InvalidConfig`] for malformed JSON, unknown fields or
    /// tolerances that are negative or not finite.
    pub fn from_json(json: &str) -> Result<Self, SolveError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| SolveError::InvalidConfig(err.to_string()))?;
        config.validate()
    }

    /// Check that both tolerances are usable.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::InvalidConfig`] for negative or non-finite tolerances.
    pub fn validate(self) -> Result<Self, SolveError> {
        for (name, value) in [
            ("pivot_tolerance", self.pivot_tolerance),
            ("residual_tolerance", self.residual_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SolveError::InvalidConfig(format!(
                    "{name} must be a non-negative number (received {value})"
                )));
            }
        }
        Ok(self)
    }
}

/// Full solution of one solve.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// Displacement per equation, prescribed and solved.
    displacements: DVector<f64>,
    /// `K · U` per equation: applied forces at free equations, reactions elsewhere.
    forces: DVector<f64>,
    /// Equations solved for, ascending.
    free: Vec<usize>,
    /// Equations with a prescribed displacement, ascending.
    prescribed: Vec<usize>,
}

impl Solution {
    /// Displacement per equation.
    #[must_use]
    pub fn displacements(&self) -> &DVector<f64> {
        &self.displacements
    }

    /// Recovered force per equation.
    #[must_use]
    pub fn forces(&self) -> &DVector<f64> {
        &self.forces
    }

    /// Equations that were solved for.
    #[must_use]
    pub fn free_dofs(&self) -> &[usize] {
        &self.free
    }

    /// Equations with a prescribed displacement.
    #[must_use]
    pub fn prescribed_dofs(&self) -> &[usize] {
        &self.prescribed
    }
}

/// Split equations into free and prescribed ones.
///
/// An equation is prescribed whenever it carries a value, zero included; only
/// `None` marks it free.
#[must_use]
pub fn partition(displacements: &[Option<f64>]) -> (Vec<usize>, Vec<usize>) {
    (0..displacements.len()).partition(|&equation| displacements[equation].is_none())
}

/// Direct solver for linear static problems.
///
/// The free block of the stiffness matrix is factorised with full pivoting. A
/// pivot ratio below [`SolverConfig::pivot_tolerance`] marks the structure as a
/// mechanism, as does a recovered force field that fails to reproduce the applied
/// loads within [`SolverConfig::residual_tolerance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearSolver {
    /// Numerical settings.
    config: SolverConfig,
}

impl LinearSolver {
    /// Solver with the supplied settings.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::InvalidConfig`] for unusable tolerances.
    pub fn with_config(config: SolverConfig) -> Result<Self, SolveError> {
        Ok(Self {
            config: config.validate()?,
        })
    }

    /// Numerical settings.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve `K_ff · U_f = F_f − K_fp · U_p` for the free displacements.
    fn solve_free(
        &self,
        system: &AssembledSystem,
        free: &[usize],
    ) -> Result<DVector<f64>, SolveError> {
        let mut position = vec![None; system.size];
        for (slot, &equation) in free.iter().enumerate() {
            position[equation] = Some(slot);
        }

        let n = free.len();
        let mut k_ff = DMatrix::<f64>::zeros(n, n);
        let mut rhs = DVector::from_fn(n, |slot, _| system.forces[free[slot]]);
        for (row, col, value) in system.stiffness.triplet_iter() {
            let Some(slot_row) = position[row] else {
                continue;
            };
            match (position[col], system.displacements[col]) {
                (Some(slot_col), _) => k_ff[(slot_row, slot_col)] += *value,
                (None, Some(prescribed)) => rhs[slot_row] -= value * prescribed,
                (None, None) => {}
            }
        }

        let lu = k_ff.full_piv_lu();
        let pivots = lu.u().diagonal().abs();
        let largest = pivots.max();
        let smallest = pivots.min();
        trace!("reduced system pivots range from {smallest:e} to {largest:e}");
        if largest == 0.0 || smallest <= self.config.pivot_tolerance * largest {
            return Err(SolveError::SingularSystem(format!(
                "smallest pivot {smallest:e} against largest {largest:e}"
            )));
        }

        let solved = lu.solve(&rhs).ok_or_else(|| {
            SolveError::SingularSystem("factorisation is not invertible".to_owned())
        })?;
        if solved.iter().any(|value| !value.is_finite()) {
            return Err(SolveError::SingularSystem(
                "solution contains non-finite values".to_owned(),
            ));
        }
        Ok(solved)
    }

    /// Reject solutions whose recovered forces miss the applied loads.
    fn check_residual(
        &self,
        system: &AssembledSystem,
        free: &[usize],
        forces: &DVector<f64>,
    ) -> Result<(), SolveError> {
        let scale = system.forces.amax().max(forces.amax());
        if scale == 0.0 {
            return Ok(());
        }
        let residual = free
            .iter()
            .map(|&equation| (forces[equation] - system.forces[equation]).abs())
            .fold(0.0, f64::max);
        debug!("relative force residual {:e}", residual / scale);
        if residual > self.config.residual_tolerance * scale {
            return Err(SolveError::SingularSystem(format!(
                "force residual {residual:e} exceeds tolerance for load scale {scale:e}"
            )));
        }
        Ok(())
    }
}

impl Solver for LinearSolver {
    fn name(&self) -> &str {
        "linear static solver"
    }

    fn solve(&self, system: &AssembledSystem) -> Result<Solution, SolveError> {
        let (free, prescribed) = partition(&system.displacements);
        debug!(
            "{} free and {} prescribed equations",
            free.len(),
            prescribed.len()
        );

        let solved = if free.is_empty() {
            DVector::zeros(0)
        } else {
            self.solve_free(system, &free)?
        };

        let mut displacements = DVector::<f64>::zeros(system.size);
        for (slot, &equation) in free.iter().enumerate() {
            displacements[equation] = solved[slot];
        }
        for &equation in &prescribed {
            displacements[equation] = system.displacements[equation].unwrap_or_default();
        }

        let forces: DVector<f64> = &system.stiffness * &displacements;
        self.check_residual(system, &free, &forces)?;

        Ok(Solution {
            displacements,
            forces,
            free,
            prescribed,
        })
    }
}
