//! Training-instance dataset: JSON `{x_train, y_train}` with instance
//! coordinates and known-optimal tours.

use std::path::Path;

use crate::error::DatasetError;
use crate::graph::{tour_length, Point};

/// On-disk shape: `x_train[i]` is an ordered list of 2D coordinates,
/// `y_train[i]` the optimal tour as 1-indexed node ids with a trailing
/// sentinel (the return to the start).
#[derive(serde::Deserialize)]
struct RawDataset {
    x_train: Vec<Vec<Point>>,
    y_train: Vec<Vec<usize>>,
}

/// One TSP instance with its known-optimal tour.
#[derive(Debug, Clone)]
pub struct Instance {
    pub nodes: Vec<Point>,
    /// 0-indexed optimal visitation order, sentinel dropped.
    pub optimal_order: Vec<usize>,
    pub optimal_length: f64,
}

/// Loaded training set.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub instances: Vec<Instance>,
}

impl Dataset {
    /// Load up to `num_instances` instances of `n_vars` nodes each. A
    /// dataset with fewer instances than requested is used in full;
    /// missing or corrupt files are fatal.
    pub fn load(path: &Path, n_vars: usize, num_instances: usize) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|e| DatasetError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let raw: RawDataset =
            serde_json::from_str(&content).map_err(|e| DatasetError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_raw(raw, n_vars, num_instances)
    }

    fn from_raw(
        raw: RawDataset,
        n_vars: usize,
        num_instances: usize,
    ) -> Result<Self, DatasetError> {
        if raw.x_train.is_empty() {
            return Err(DatasetError::Empty);
        }
        if raw.x_train.len() != raw.y_train.len() {
            return Err(DatasetError::LengthMismatch {
                x_len: raw.x_train.len(),
                y_len: raw.y_train.len(),
            });
        }

        let take = num_instances.min(raw.x_train.len());
        let mut instances = Vec::with_capacity(take);
        for (index, (nodes, tour)) in raw
            .x_train
            .into_iter()
            .zip(raw.y_train)
            .take(take)
            .enumerate()
        {
            if nodes.len() != n_vars {
                return Err(DatasetError::WrongInstanceSize {
                    index,
                    expected: n_vars,
                    got: nodes.len(),
                });
            }
            // Drop the trailing sentinel, shift to 0-indexed.
            let optimal_order = tour[..tour.len().saturating_sub(1)]
                .iter()
                .map(|&entry| {
                    if entry == 0 || entry > n_vars {
                        return Err(DatasetError::BadTourEntry {
                            index,
                            entry,
                            max: n_vars,
                        });
                    }
                    Ok(entry - 1)
                })
                .collect::<Result<Vec<_>, _>>()?;
            let optimal_length = tour_length(&nodes, &optimal_order);
            instances.push(Instance {
                nodes,
                optimal_order,
                optimal_length,
            });
        }

        Ok(Dataset { instances })
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(n_instances: usize) -> RawDataset {
        let nodes = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        RawDataset {
            x_train: vec![nodes; n_instances],
            y_train: vec![vec![1, 2, 3, 1]; n_instances],
        }
    }

    #[test]
    fn test_decodes_one_indexed_tour_with_sentinel() {
        let dataset = Dataset::from_raw(raw(1), 3, 10).unwrap();
        assert_eq!(dataset.len(), 1);
        let instance = &dataset.instances[0];
        assert_eq!(instance.optimal_order, vec![0, 1, 2]);
        assert!((instance.optimal_length - (2.0 + 2f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn test_truncates_to_requested_instances() {
        let dataset = Dataset::from_raw(raw(5), 3, 2).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_fewer_instances_than_requested_is_fine() {
        let dataset = Dataset::from_raw(raw(2), 3, 100).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_wrong_instance_size_rejected() {
        let err = Dataset::from_raw(raw(1), 5, 10).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::WrongInstanceSize { expected: 5, got: 3, .. }
        ));
    }

    #[test]
    fn test_zero_tour_entry_rejected() {
        let mut bad = raw(1);
        bad.y_train[0] = vec![0, 2, 3, 1];
        let err = Dataset::from_raw(bad, 3, 10).unwrap_err();
        assert!(matches!(err, DatasetError::BadTourEntry { entry: 0, .. }));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = Dataset::load(Path::new("/nonexistent/tsp.json"), 3, 1).unwrap_err();
        assert!(matches!(err, DatasetError::FileRead { .. }));
    }

    #[test]
    fn test_load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsp.json");
        std::fs::write(
            &path,
            r#"{"x_train": [[[0.0,0.0],[1.0,0.0],[0.0,1.0]]], "y_train": [[1,3,2,1]]}"#,
        )
        .unwrap();
        let dataset = Dataset::load(&path, 3, 1).unwrap();
        assert_eq!(dataset.instances[0].optimal_order, vec![0, 2, 1]);
    }
}
