use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

use crate::{
    encoding::AlignedRow,
    error::{Error, Result},
};

pub const FORMAT_VERSION: u32 = 1;

/// Fitted linear model plus the column order it expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub n_samples: usize,
}

impl ModelArtifact {
    pub fn new(
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
        n_samples: usize,
    ) -> Result<Self> {
        let artifact = Self {
            format_version: FORMAT_VERSION,
            feature_names,
            coefficients,
            intercept,
            n_samples,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let artifact: Self = serde_json::from_str(&txt)?;
        artifact.validate()?;
        tracing::info!(
            "loaded model from {}; {} features, trained on {} rows",
            path.display(),
            artifact.feature_names.len(),
            artifact.n_samples
        );
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let txt = serde_json::to_string_pretty(self)?;
        fs::write(path, txt).map_err(|e| Error::io(path, e))
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::Artifact(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if self.coefficients.len() != self.feature_names.len() {
            return Err(Error::Artifact(format!(
                "{} coefficients for {} feature names",
                self.coefficients.len(),
                self.feature_names.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.feature_names.len());
        if let Some(dup) = self.feature_names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(Error::Artifact(format!("duplicate feature name {dup:?}")));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(Error::Artifact("non-finite coefficient or intercept".into()));
        }
        Ok(())
    }

    /// Linear prediction for a row already aligned to `feature_names`.
    pub fn predict(&self, row: &AlignedRow<'_>) -> Result<f64> {
        if row.values.len() != self.coefficients.len() {
            return Err(Error::Artifact(format!(
                "feature length mismatch: got {}, expected {}",
                row.values.len(),
                self.coefficients.len()
            )));
        }
        Ok(self.predict_values(&row.values))
    }

    pub(crate) fn predict_values(&self, x: &[f64]) -> f64 {
        self.intercept
            + x.iter()
                .zip(&self.coefficients)
                .map(|(x, c)| x * c)
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{align, encode_row};
    use crate::types::RaceFeatures;

    fn artifact() -> ModelArtifact {
        ModelArtifact::new(
            vec![
                "grid_position".into(),
                "driver_Hamilton".into(),
                "track_Monza".into(),
            ],
            vec![0.5, -1.0, 2.0],
            1.25,
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_predict_dot_plus_intercept() {
        let m = artifact();
        let row = encode_row(&RaceFeatures {
            driver: "Hamilton".into(),
            track: "Monza".into(),
            weather: "Dry".into(),
            grid_position: 4,
        });
        let aligned = align(&row, &m.feature_names);
        // 1.25 + 0.5*4 - 1 + 2
        assert_eq!(m.predict(&aligned).unwrap(), 4.25);
    }

    #[test]
    fn test_predict_rejects_wrong_length() {
        let m = artifact();
        let cols = vec!["grid_position".to_string()];
        let row = AlignedRow {
            columns: &cols,
            values: vec![1.0],
        };
        assert!(matches!(m.predict(&row), Err(Error::Artifact(_))));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let m = artifact();
        m.save(&path).unwrap();
        assert_eq!(ModelArtifact::load(&path).unwrap(), m);
    }

    #[test]
    fn test_load_rejects_mismatched_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"format_version":1,"feature_names":["a","b"],"coefficients":[1.0],"intercept":0.0,"n_samples":2}"#,
        )
        .unwrap();
        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, Error::Artifact(_)), "got {err}");
    }

    #[test]
    fn test_duplicate_feature_names_rejected() {
        let err = ModelArtifact::new(vec!["a".into(), "a".into()], vec![1.0, 2.0], 0.0, 1)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ModelArtifact::load("/definitely/not/here/model.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
