//! Material properties

use serde::{Deserialize, Serialize};

use crate::error::{SectionError, SectionResult};

/// Name of the reserved material used for purely geometric analyses
pub const DEFAULT_MATERIAL_NAME: &str = "default";

/// Material properties for cross-section analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Modulus of elasticity (Young's modulus)
    pub elastic_modulus: f64,
    /// Poisson's ratio
    pub poissons_ratio: f64,
    /// Density (mass per unit volume)
    pub density: f64,
    /// Yield strength
    pub yield_strength: f64,
    /// Display colour, passed through untouched
    pub color: String,
}

impl Material {
    /// Create a new material, validating its properties
    pub fn new(
        name: &str,
        elastic_modulus: f64,
        poissons_ratio: f64,
        yield_strength: f64,
        density: f64,
        color: &str,
    ) -> SectionResult<Self> {
        if !(elastic_modulus > 0.0 && elastic_modulus.is_finite()) {
            return Err(SectionError::InvalidMaterial(format!(
                "{name}: elastic modulus must be positive, got {elastic_modulus}"
            )));
        }
        if !(0.0..0.5).contains(&poissons_ratio) {
            return Err(SectionError::InvalidMaterial(format!(
                "{name}: Poisson's ratio must lie in [0, 0.5), got {poissons_ratio}"
            )));
        }
        if !(yield_strength > 0.0 && yield_strength.is_finite()) {
            return Err(SectionError::InvalidMaterial(format!(
                "{name}: yield strength must be positive, got {yield_strength}"
            )));
        }
        if !(density >= 0.0 && density.is_finite()) {
            return Err(SectionError::InvalidMaterial(format!(
                "{name}: density must be non-negative, got {density}"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            elastic_modulus,
            poissons_ratio,
            density,
            yield_strength,
            color: color.to_string(),
        })
    }

    /// The reserved material of geometric-only analyses: E = 1, nu = 0, fy = 1, density = 1
    pub fn default_material() -> Self {
        Self {
            name: DEFAULT_MATERIAL_NAME.to_string(),
            elastic_modulus: 1.0,
            poissons_ratio: 0.0,
            density: 1.0,
            yield_strength: 1.0,
            color: "w".to_string(),
        }
    }

    /// Whether this is the reserved geometric-only material
    pub fn is_default(&self) -> bool {
        *self == Self::default_material()
    }

    /// Shear modulus of an isotropic material, E / (2 * (1 + nu))
    pub fn shear_modulus(&self) -> f64 {
        self.elastic_modulus / (2.0 * (1.0 + self.poissons_ratio))
    }

    /// Structural steel in N and mm (E = 200 GPa, fy = 500 MPa)
    pub fn steel() -> Self {
        Self {
            name: "Steel".to_string(),
            elastic_modulus: 200e3,
            poissons_ratio: 0.3,
            density: 7.85e-6,
            yield_strength: 500.0,
            color: "grey".to_string(),
        }
    }

    /// Timber in N and mm
    pub fn timber() -> Self {
        Self {
            name: "Timber".to_string(),
            elastic_modulus: 8e3,
            poissons_ratio: 0.35,
            density: 6.5e-7,
            yield_strength: 20.0,
            color: "burlywood".to_string(),
        }
    }

    /// Concrete in N and mm
    pub fn concrete() -> Self {
        Self {
            name: "Concrete".to_string(),
            elastic_modulus: 30.1e3,
            poissons_ratio: 0.2,
            density: 2.4e-6,
            yield_strength: 32.0,
            color: "lightgrey".to_string(),
        }
    }

    /// Aluminium 6061-T6 in N and mm
    pub fn aluminium() -> Self {
        Self {
            name: "Aluminium".to_string(),
            elastic_modulus: 68.9e3,
            poissons_ratio: 0.33,
            density: 2.7e-6,
            yield_strength: 276.0,
            color: "silver".to_string(),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::default_material()
    }
}

/// Ordered, deduplicated set of the materials used by a mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
}

impl MaterialRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `material`, inserting it if it is new
    pub fn insert(&mut self, material: &Material) -> SectionResult<usize> {
        if let Some(idx) = self.materials.iter().position(|m| m == material) {
            return Ok(idx);
        }
        if self.materials.iter().any(|m| m.name == material.name) {
            return Err(SectionError::InvalidMaterial(format!(
                "two different materials share the name '{}'",
                material.name
            )));
        }
        self.materials.push(material.clone());
        Ok(self.materials.len() - 1)
    }

    /// Material at `idx`
    pub fn get(&self, idx: usize) -> Option<&Material> {
        self.materials.get(idx)
    }

    /// Index of the material called `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name)
    }

    /// Replace the material called `name`, keeping its index
    pub fn replace(&mut self, name: &str, material: Material) -> SectionResult<usize> {
        let idx = self
            .index_of(name)
            .ok_or_else(|| SectionError::MaterialNotFound(name.to_string()))?;
        if self
            .materials
            .iter()
            .enumerate()
            .any(|(i, m)| i != idx && m.name == material.name)
        {
            return Err(SectionError::InvalidMaterial(format!(
                "material name '{}' is already in use",
                material.name
            )));
        }
        self.materials[idx] = material;
        Ok(idx)
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Iterate over the materials in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }
}
