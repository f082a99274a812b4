use serde::{Deserialize, Serialize};

use gca_core::ShapeParams;

use crate::error::{ClusterError, ClusterResult};

/// On-disk simulation description for the `gca-run` binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(rename = "box")]
    pub box_: [f64; 3],
    pub particles: usize,
    pub shape: ShapeSpec,
    #[serde(default)]
    pub patch: Option<PatchSpec>,
    #[serde(default = "default_ndim")]
    pub ndim: u32,
    #[serde(default = "default_steps")]
    pub steps: u64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_move_ratio")]
    pub move_ratio: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeSpec {
    Sphere { diameter: f64 },
    Spherocylinder { diameter: f64, length: f64 },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PatchSpec {
    pub epsilon: f32,
    pub r_cut: f64,
}

fn default_ndim() -> u32 {
    3
}

fn default_steps() -> u64 {
    100
}

fn default_move_ratio() -> f64 {
    0.5
}

impl SimulationConfig {
    pub fn from_json(text: &str) -> ClusterResult<Self> {
        let cfg: SimulationConfig = serde_json::from_str(text)?;
        cfg.normalized()
    }

    /// Validate and return the config; bad values are hard errors.
    pub fn normalized(self) -> ClusterResult<Self> {
        if self.box_.iter().any(|&l| l <= 0.0) {
            return Err(ClusterError::Invalid("box lengths must be positive".into()));
        }
        if self.particles == 0 {
            return Err(ClusterError::Invalid(
                "particle count must be positive".into(),
            ));
        }
        if self.ndim != 2 && self.ndim != 3 {
            return Err(ClusterError::Invalid(format!(
                "ndim must be 2 or 3, got {}",
                self.ndim
            )));
        }
        if !(0.0..=1.0).contains(&self.move_ratio) {
            return Err(ClusterError::Invalid(format!(
                "move_ratio must lie in [0, 1], got {}",
                self.move_ratio
            )));
        }
        match self.shape {
            ShapeSpec::Sphere { diameter } if diameter <= 0.0 => {
                return Err(ClusterError::Invalid("sphere diameter must be positive".into()));
            }
            ShapeSpec::Spherocylinder { diameter, length }
                if diameter <= 0.0 || length <= 0.0 =>
            {
                return Err(ClusterError::Invalid(
                    "spherocylinder diameter and length must be positive".into(),
                ));
            }
            _ => {}
        }
        if let Some(patch) = &self.patch {
            if patch.r_cut <= 0.0 {
                return Err(ClusterError::Invalid("patch r_cut must be positive".into()));
            }
        }
        Ok(self)
    }

    pub fn shape_params(&self) -> ShapeParams {
        match self.shape {
            ShapeSpec::Sphere { diameter } => ShapeParams::Sphere { diameter },
            ShapeSpec::Spherocylinder { diameter, length } => {
                ShapeParams::Spherocylinder { diameter, length }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_json() -> String {
        r#"{
            "box": [10.0, 10.0, 10.0],
            "particles": 64,
            "shape": {"kind": "sphere", "diameter": 1.0}
        }"#
        .to_string()
    }

    #[test]
    fn defaults_are_filled() {
        let cfg = SimulationConfig::from_json(&base_json()).unwrap();
        assert_eq!(cfg.ndim, 3);
        assert_eq!(cfg.steps, 100);
        assert_eq!(cfg.move_ratio, 0.5);
        assert!(cfg.patch.is_none());
    }

    #[test]
    fn bad_move_ratio_is_an_error() {
        let text = base_json().replace(
            "\"particles\": 64,",
            "\"particles\": 64, \"move_ratio\": 1.5,",
        );
        assert!(SimulationConfig::from_json(&text).is_err());
    }

    #[test]
    fn zero_particles_is_an_error() {
        let text = base_json().replace("\"particles\": 64", "\"particles\": 0");
        assert!(SimulationConfig::from_json(&text).is_err());
    }

    #[test]
    fn negative_box_is_an_error() {
        let text = base_json().replace("[10.0, 10.0, 10.0]", "[10.0, -1.0, 10.0]");
        assert!(SimulationConfig::from_json(&text).is_err());
    }

    #[test]
    fn spherocylinder_shape_parses() {
        let text = base_json().replace(
            r#"{"kind": "sphere", "diameter": 1.0}"#,
            r#"{"kind": "spherocylinder", "diameter": 1.0, "length": 3.0}"#,
        );
        let cfg = SimulationConfig::from_json(&text).unwrap();
        assert!(matches!(
            cfg.shape_params(),
            ShapeParams::Spherocylinder { .. }
        ));
    }
}
