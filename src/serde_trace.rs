//! JSON encoding of traces and loss grids (feature: `serde`).
//!
//! The field names of the snapshot structs are the wire contract read by the
//! visualization frontend, so they are fixed with `serde` attributes on the
//! types themselves. A [`TrainingRun`] is written as a bare JSON array of step
//! records; a [`LossGrid`] as a single object.
//!
//! `serde_json` writes non-finite floats as `null`. A diverged trace therefore
//! still serializes, but its `NaN`/`Inf` fields cannot be read back as numbers.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::surface::LossGrid;
use crate::train::TrainingRun;
use crate::{Error, Result};

/// Serialize any wire type to a pretty-printed JSON string.
pub fn to_json_string_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Json(format!("failed to serialize: {e}")))
}

/// Serialize any wire type to a compact JSON string.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Json(format!("failed to serialize: {e}")))
}

/// Parse any wire type from a JSON string.
pub fn from_json_str<T: DeserializeOwned>(s: &str) -> Result<T> {
    serde_json::from_str(s).map_err(|e| Error::Json(format!("failed to parse json: {e}")))
}

/// Write `value` as pretty JSON, creating missing parent directories.
pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let p = path.as_ref();
    if let Some(dir) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Io(format!("failed to create {}: {e}", dir.display())))?;
    }
    let s = to_json_string_pretty(value)?;
    std::fs::write(p, s).map_err(|e| Error::Io(format!("failed to write {}: {e}", p.display())))?;
    tracing::debug!(path = %p.display(), "wrote json");
    Ok(())
}

/// Read and parse a JSON file.
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let p = path.as_ref();
    let s = std::fs::read_to_string(p)
        .map_err(|e| Error::Io(format!("failed to read {}: {e}", p.display())))?;
    from_json_str(&s)
}

impl<S: Serialize + DeserializeOwned> TrainingRun<S> {
    /// Serialize the run to a pretty-printed JSON array.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        to_json_string_pretty(self)
    }

    /// Serialize the run to a compact JSON array.
    pub fn to_json_string(&self) -> Result<String> {
        to_json_string(self)
    }

    /// Parse a run from a JSON array of step records.
    pub fn from_json_str(s: &str) -> Result<Self> {
        from_json_str(s)
    }

    /// Save the run to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path)
    }

    /// Load a run from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_json(path)
    }
}

impl LossGrid {
    pub fn to_json_string(&self) -> Result<String> {
        to_json_string(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        from_json_str(s)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data::{DataPoint, DataPoint2D, Dataset, NeuronPoint};
    use crate::neuron::{self, NeuronParams, NeuronSnapshot};
    use crate::scalar::{self, Snapshot};
    use crate::surface::{LossGridConfig, compute_loss_grid};
    use crate::Activation;

    fn scalar_run() -> TrainingRun<Snapshot> {
        let data = Dataset::new(vec![DataPoint::new(1.0, 2.1), DataPoint::new(2.0, 3.9)]).unwrap();
        let cfg = scalar::TrainingConfig {
            w_init: 0.0,
            lr: 0.01,
            steps: 2,
        };
        scalar::train(&data, &cfg).unwrap()
    }

    #[test]
    fn scalar_run_is_a_json_array_with_wire_names() {
        let json = scalar_run().to_json_string().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(arr.len(), 2);

        let s0 = &arr[0];
        for key in ["step", "w", "grad_w", "loss", "point_details", "update_components"] {
            assert!(s0.get(key).is_some(), "missing {key}");
        }
        let u = &s0["update_components"];
        for key in ["w_old", "lr", "grad_w", "delta_w", "w_new"] {
            assert!(u.get(key).is_some(), "missing update_components.{key}");
        }
        let p = &s0["point_details"][0];
        for key in ["x", "y_true", "y_pred", "point_loss", "point_grad"] {
            assert!(p.get(key).is_some(), "missing point_details.{key}");
        }
    }

    #[test]
    fn neuron_snapshot_uses_calculus_field_names() {
        let data = Dataset::new(vec![NeuronPoint::new(vec![0.5, 1.0], 0.3)]).unwrap();
        let cfg = neuron::TrainingConfig {
            learning_rate: 0.1,
            num_steps: 1,
            activation: Activation::ReLU,
        };
        let run = neuron::train(&data, &NeuronParams::new(vec![0.1, 0.2], 0.0), &cfg).unwrap();
        let json = run.to_json_string().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        let s0 = &v[0];

        assert_eq!(s0["activation"], "relu");
        for key in ["dL_dz", "dL_da", "local_derivative", "in_saturation_zone", "chain_rule_breakdown"] {
            assert!(s0.get(key).is_some(), "missing {key}");
        }
        let p = &s0["point_details"][0];
        for key in ["index", "z", "a", "dL_da", "da_dz", "dL_dz", "dz_dw", "dL_dw", "dL_db", "in_saturation"] {
            assert!(p.get(key).is_some(), "missing point_details.{key}");
        }
        let c = &s0["chain_rule_breakdown"]["components"][2];
        assert_eq!(c["param_name"], "b");
        assert!(c.get("dL_dparam").is_some());

        let back: TrainingRun<NeuronSnapshot> = TrainingRun::from_json_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.snapshots()[0].activation, Activation::ReLU);
    }

    #[test]
    fn loss_grid_round_trips() {
        let data = Dataset::new(vec![DataPoint2D::new(1.0, 1.0, 2.0)]).unwrap();
        let cfg = LossGridConfig::new((0.0, 1.0), (0.0, 1.0), 2).unwrap();
        let grid = compute_loss_grid(&data, &cfg).unwrap();
        let json = grid.to_json_string().unwrap();

        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in ["w1_min", "w1_max", "w2_min", "w2_max", "resolution", "points"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert_eq!(LossGrid::from_json_str(&json).unwrap(), grid);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("snapshots.json");
        let run = scalar_run();
        run.save_json(&path).unwrap();

        let loaded = TrainingRun::<Snapshot>::load_json(&path).unwrap();
        assert_eq!(loaded.len(), run.len());
        assert!(load_json::<Vec<Snapshot>, _>(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = TrainingRun::<Snapshot>::from_json_str("{\"step\": 0}").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
