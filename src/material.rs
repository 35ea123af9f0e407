//! Linear isotropic material records.

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Linear structural material.
///
/// Only the elastic modulus takes part in link analysis. Poisson's ratio and
/// density are carried for reporting. Every property is optional so a record can
/// describe partially known materials, but elements that need a property ask for
/// it through an accessor that fails instead of yielding an absent value.
///
/// # Examples
/// ```
/// use trussfea::Material;
///
/// let steel = Material::linear(29.0e6).with_poisson_ratio(0.3);
/// assert_eq!(steel.elastic_modulus(), Ok(29.0e6));
/// assert!(Material::default().elastic_modulus().is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Young's modulus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic_modulus: Option<f64>,
    /// Poisson's ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poisson_ratio: Option<f64>,
    /// Mass density.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

impl Material {
    /// Material defined by its elastic modulus alone.
    #[must_use]
    pub fn linear(elastic_modulus: f64) -> Self {
        Self {
            elastic_modulus: Some(elastic_modulus),
            ..Self::default()
        }
    }

    /// Set Poisson's ratio.
    #[must_use]
    pub fn with_poisson_ratio(mut self, poisson_ratio: f64) -> Self {
        self.poisson_ratio = Some(poisson_ratio);
        self
    }

    /// Set the mass density.
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = Some(density);
        self
    }

    /// Elastic modulus required by axial elements.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingElasticModulus`] when the property is absent and
    /// [`ModelError::NonPositiveElasticModulus`] when it is zero or negative.
    pub fn elastic_modulus(&self) -> Result<f64, ModelError> {
        let modulus = self
            .elastic_modulus
            .ok_or(ModelError::MissingElasticModulus)?;
        if modulus <= 0.0 || !modulus.is_finite() {
            return Err(ModelError::NonPositiveElasticModulus(modulus));
        }
        Ok(modulus)
    }

    /// Defined properties as `(label, value)` pairs.
    pub fn properties(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("E", self.elastic_modulus),
            ("nu", self.poisson_ratio),
            ("rho", self.density),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|value| (label, value)))
    }
}
