//! Run artifact persistence: metadata, per-episode length histories, and
//! the trainable parameters, written as JSON via tmp-file-then-rename.

use std::fs;
use std::path::{Path, PathBuf};

use crate::agent::ParameterSnapshot;
use crate::error::PersistError;

/// Run metadata, updated as training progresses.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunMeta {
    pub num_instances: usize,
    pub best_tour_length: f64,
    pub best_tour: Vec<usize>,
    pub best_tour_ix: usize,
    pub env_solved: bool,
}

impl RunMeta {
    pub fn new(num_instances: usize) -> Self {
        RunMeta {
            num_instances,
            best_tour_length: f64::INFINITY,
            best_tour: Vec::new(),
            best_tour_ix: 0,
            env_solved: false,
        }
    }
}

/// Writes the artifact set for one named run into an output directory:
/// `{run}_meta.json`, `{run}_tour_lengths.json`,
/// `{run}_optimal_lengths.json`, `{run}_params.json`.
pub struct RunWriter {
    dir: PathBuf,
    run_name: String,
}

impl RunWriter {
    pub fn new(dir: &Path, run_name: &str) -> Result<Self, PersistError> {
        fs::create_dir_all(dir)?;
        Ok(RunWriter {
            dir: dir.to_path_buf(),
            run_name: run_name.to_string(),
        })
    }

    /// Persist the full artifact set. Each file is written to a `.tmp`
    /// sibling first and renamed into place, so a crash mid-write never
    /// leaves a truncated artifact.
    pub fn write_run(
        &self,
        meta: &RunMeta,
        tour_lengths: &[f64],
        optimal_lengths: &[f64],
        params: &ParameterSnapshot,
    ) -> Result<(), PersistError> {
        self.write_json("meta", meta)?;
        self.write_json("tour_lengths", &tour_lengths)?;
        self.write_json("optimal_lengths", &optimal_lengths)?;
        self.write_json("params", params)?;
        Ok(())
    }

    fn write_json<T: serde::Serialize>(&self, suffix: &str, value: &T) -> Result<(), PersistError> {
        let path = self.artifact_path(suffix);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", self.run_name, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RunWriter::new(dir.path(), "test_run").unwrap();
        let mut meta = RunMeta::new(3);
        meta.best_tour_length = 3.41;
        meta.best_tour = vec![0, 1, 2, 0];

        let params = ParameterSnapshot::Scalars {
            values: vec![1.1, 1.0],
        };
        writer
            .write_run(&meta, &[3.5, 3.41], &[3.41, 3.41], &params)
            .unwrap();

        for suffix in ["meta", "tour_lengths", "optimal_lengths", "params"] {
            assert!(writer.artifact_path(suffix).exists(), "missing {suffix}");
        }

        let text = fs::read_to_string(writer.artifact_path("meta")).unwrap();
        let parsed: RunMeta = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.best_tour, vec![0, 1, 2, 0]);
        assert!(!parsed.env_solved);
    }

    #[test]
    fn test_rewrite_overwrites_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RunWriter::new(dir.path(), "run").unwrap();
        let params = ParameterSnapshot::Scalars { values: vec![0.0] };
        let meta = RunMeta::new(1);

        writer.write_run(&meta, &[1.0], &[1.0], &params).unwrap();
        writer.write_run(&meta, &[1.0, 2.0], &[1.0, 1.0], &params).unwrap();

        let text = fs::read_to_string(writer.artifact_path("tour_lengths")).unwrap();
        let lengths: Vec<f64> = serde_json::from_str(&text).unwrap();
        assert_eq!(lengths, vec![1.0, 2.0]);
        // No stray tmp files left behind.
        let tmp_left = fs::read_dir(dir.path())
            .unwrap()
            .any(|e| e.unwrap().path().to_string_lossy().ends_with(".tmp"));
        assert!(!tmp_left);
    }

    #[test]
    fn test_group_snapshot_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RunWriter::new(dir.path(), "grad").unwrap();
        let params = ParameterSnapshot::Groups {
            groups: vec![crate::agent::SnapshotGroup {
                name: "edge_weights".into(),
                values: vec![0.5, -0.25, 1.0],
            }],
        };
        writer
            .write_run(&RunMeta::new(1), &[], &[], &params)
            .unwrap();

        let text = fs::read_to_string(writer.artifact_path("params")).unwrap();
        let parsed: ParameterSnapshot = serde_json::from_str(&text).unwrap();
        match parsed {
            ParameterSnapshot::Groups { groups } => {
                assert_eq!(groups[0].name, "edge_weights");
                assert_eq!(groups[0].values, vec![0.5, -0.25, 1.0]);
            }
            other => panic!("expected groups, got {other:?}"),
        }
    }
}
