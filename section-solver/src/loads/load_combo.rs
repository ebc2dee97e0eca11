//! Load combinations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{SectionError, SectionResult};
use crate::loads::LoadCase;

/// A load combination defines how load cases are factored and summed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCombination {
    /// Name of the load combination
    pub name: String,
    /// Factors for each load case (case_name -> factor)
    pub factors: HashMap<String, f64>,
}

impl LoadCombination {
    /// Create a new load combination
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            factors: HashMap::new(),
        }
    }

    /// Add a load case with a factor
    pub fn with_case(mut self, case: &str, factor: f64) -> Self {
        self.factors.insert(case.to_string(), factor);
        self
    }

    /// Get the factor for a load case
    pub fn factor(&self, case: &str) -> f64 {
        self.factors.get(case).copied().unwrap_or(0.0)
    }

    /// The factored sum of `cases` as a single load case.
    ///
    /// Every case named by the combination must be present.
    pub fn combine(&self, cases: &[LoadCase]) -> SectionResult<LoadCase> {
        let mut names: Vec<&String> = self.factors.keys().collect();
        names.sort();

        let mut total = LoadCase::new(&self.name);
        for name in names {
            let case = cases.iter().find(|c| &c.name == name).ok_or_else(|| {
                SectionError::InvalidInput(format!(
                    "load combination '{}' refers to missing load case '{name}'",
                    self.name
                ))
            })?;
            let factored = case * self.factor(name);
            total = LoadCase {
                name: self.name.clone(),
                ..(&total + &factored)
            };
        }
        Ok(total)
    }

    /// Create common LRFD combinations
    pub fn lrfd_dead_only() -> Self {
        Self::new("1.4D").with_case("Dead", 1.4)
    }

    pub fn lrfd_dead_live() -> Self {
        Self::new("1.2D + 1.6L")
            .with_case("Dead", 1.2)
            .with_case("Live", 1.6)
    }

    /// Create common ASD combinations
    pub fn asd_dead_live() -> Self {
        Self::new("D + L")
            .with_case("Dead", 1.0)
            .with_case("Live", 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_factors_cases() {
        let dead = LoadCase::dead().with_mxx(10.0).with_vy(2.0);
        let live = LoadCase::live().with_mxx(5.0);
        let combo = LoadCombination::lrfd_dead_live().combine(&[dead, live]).unwrap();
        assert!((combo.mxx - 20.0).abs() < 1e-12);
        assert!((combo.vy - 2.4).abs() < 1e-12);
        assert_eq!(combo.name, "1.2D + 1.6L");
    }

    #[test]
    fn test_missing_case_is_an_error() {
        let dead = LoadCase::dead();
        assert!(LoadCombination::lrfd_dead_live().combine(&[dead]).is_err());
    }
}
