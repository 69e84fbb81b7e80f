//! Configuration of the consistency maximization
//!
//! Loaded from a TOML file; every field is optional.
//!
//! ```toml
//! confidence = 0.99
//! clique_method = "heuristic"
//! consistency_graph_path = "out/consistency_matrix.clq.mtx"
//! ```

use crate::error::{Error, Result};
use crate::solver::{chi_squared_critical, legacy_threshold, Confidence};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONSISTENCY_MATRIX_FILE_NAME: &str = "consistency_matrix.clq.mtx";
pub const CONSISTENCY_LOOP_CLOSURES_FILE_NAME: &str = "consistent_loop_closures.txt";

/// Maximum clique algorithm
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CliqueMethod {
    #[default]
    Exact,
    Heuristic,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PcmConfig {
    /// Chi-squared threshold on the squared Mahalanobis distance. Takes
    /// precedence over `confidence` and `legacy_threshold`.
    pub threshold: Option<f64>,
    /// Confidence level (0.90, 0.95 or 0.99) of the chi-squared threshold.
    pub confidence: f64,
    /// Use the hand-picked thresholds (0.58 in 2D, 2.20 in 3D).
    pub legacy_threshold: bool,

    pub clique_method: CliqueMethod,
    /// Work budget of the clique solver, unbounded when absent.
    pub clique_budget: Option<usize>,

    /// Where the consistency graph is saved, skipped when absent.
    pub consistency_graph_path: Option<PathBuf>,
    /// Where the consistent loop closures are saved, skipped when absent.
    pub loop_closures_path: Option<PathBuf>,
    /// Where the pruned pose graph is saved, skipped when absent.
    pub pose_graph_path: Option<PathBuf>,
}

impl Default for PcmConfig {
    fn default() -> Self {
        Self {
            threshold: None,
            confidence: 0.95,
            legacy_threshold: false,
            clique_method: CliqueMethod::default(),
            clique_budget: None,
            consistency_graph_path: Some(CONSISTENCY_MATRIX_FILE_NAME.into()),
            loop_closures_path: Some(CONSISTENCY_LOOP_CLOSURES_FILE_NAME.into()),
            pose_graph_path: None,
        }
    }
}

impl PcmConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Chi-squared threshold for measurements with `dof` degrees of freedom.
    pub fn threshold_for(&self, dof: usize) -> Result<f64> {
        if let Some(threshold) = self.threshold {
            return Ok(threshold);
        }
        if self.legacy_threshold {
            return Ok(legacy_threshold(dof));
        }

        Confidence::from_probability(self.confidence)
            .and_then(|confidence| chi_squared_critical(dof, confidence))
            .ok_or_else(|| {
                Error::Config(format!(
                    "no chi-squared value for {} dof at confidence {}",
                    dof, self.confidence
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let config = PcmConfig::default();
        assert_eq!(config.threshold_for(3).unwrap(), 7.815);
        assert_eq!(config.threshold_for(6).unwrap(), 12.592);
    }

    #[test]
    fn test_threshold_precedence() {
        let config = PcmConfig {
            threshold: Some(1.5),
            legacy_threshold: true,
            ..PcmConfig::default()
        };
        assert_eq!(config.threshold_for(3).unwrap(), 1.5);

        let config = PcmConfig {
            legacy_threshold: true,
            ..PcmConfig::default()
        };
        assert_eq!(config.threshold_for(3).unwrap(), 0.58);
        assert_eq!(config.threshold_for(6).unwrap(), 2.20);

        let config = PcmConfig {
            confidence: 0.5,
            ..PcmConfig::default()
        };
        assert!(config.threshold_for(3).is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = PcmConfig::from_toml(
            r#"
            confidence = 0.99
            clique_method = "heuristic"
            pose_graph_path = "global.g2o"
            "#,
        )
        .unwrap();

        assert_eq!(config.clique_method, CliqueMethod::Heuristic);
        assert_eq!(config.threshold_for(6).unwrap(), 16.812);
        assert_eq!(config.pose_graph_path, Some(PathBuf::from("global.g2o")));
        assert_eq!(
            config.loop_closures_path,
            Some(PathBuf::from(CONSISTENCY_LOOP_CLOSURES_FILE_NAME))
        );
        assert!(PcmConfig::from_toml("confidence = \"high\"").is_err());
    }
}
