//! `model.yaml`: cross-validation settings and candidate models.
//!
//! The fold count is read from `grid_search.cv`, or from `grid_search.params.cv`
//! when the search is written in the factory layout:
//!
//! ```yaml
//! grid_search:
//!   class: GridSearchCV
//!   module: sklearn.model_selection
//!   params:
//!     cv: 5
//!     verbose: 2
//! ```
//!
//! `verbose` is accepted and ignored; search progress is logged at debug.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;
use visa_model::read_yaml_file;

use crate::classifier::{ModelClass, ModelParams};
use crate::error::{Result, TrainError};

pub const DEFAULT_CV: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModelConfig {
    #[serde(default)]
    grid_search: RawGridSearch,
    model_selection: Mapping,
}

const GRID_SEARCH_CLASS: &str = "GridSearchCV";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawGridSearch {
    cv: Option<usize>,
    class: Option<String>,
    module: Option<String>,
    params: RawSearchParams,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSearchParams {
    cv: Option<usize>,
    verbose: Option<u8>,
}

impl RawGridSearch {
    fn folds(&self) -> Result<usize> {
        if let Some(class) = &self.class
            && class != GRID_SEARCH_CLASS
        {
            let qualified = match &self.module {
                Some(module) => format!("{module}.{class}"),
                None => class.clone(),
            };
            return Err(TrainError::invalid_config(format!(
                "grid_search.class must be {GRID_SEARCH_CLASS}, got {qualified}"
            )));
        }
        if let Some(verbose) = self.params.verbose {
            debug!(verbose, "grid_search.params.verbose ignored");
        }
        let cv = match (self.cv, self.params.cv) {
            (Some(top), Some(nested)) if top != nested => {
                return Err(TrainError::invalid_config(format!(
                    "grid_search.cv ({top}) and grid_search.params.cv ({nested}) disagree"
                )));
            }
            (Some(cv), _) | (None, Some(cv)) => cv,
            (None, None) => DEFAULT_CV,
        };
        if cv < 2 {
            return Err(TrainError::invalid_config(format!(
                "grid_search.cv must be at least 2, got {cv}"
            )));
        }
        Ok(cv)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCandidate {
    class: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    params: Mapping,
    #[serde(default)]
    search_param_grid: Mapping,
}

/// One `model_selection` entry with its expanded parameter grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSpec {
    /// Key under `model_selection`, e.g. `module_0`.
    pub key: String,
    pub class: ModelClass,
    /// Every grid combination laid over the base params, in grid order.
    pub grid: Vec<ModelParams>,
}

/// Parsed and checked model configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub cv: usize,
    /// Candidates in file order.
    pub candidates: Vec<CandidateSpec>,
}

impl ModelConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw: RawModelConfig = read_yaml_file(path)?;
        Self::from_raw(raw)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawModelConfig =
            serde_yaml::from_str(yaml).map_err(|e| TrainError::invalid_config(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawModelConfig) -> Result<Self> {
        let cv = raw.grid_search.folds()?;
        if raw.model_selection.is_empty() {
            return Err(TrainError::invalid_config("model_selection is empty"));
        }

        let mut candidates = Vec::with_capacity(raw.model_selection.len());
        for (key, value) in raw.model_selection {
            let key = key_string(&key)?;
            let entry: RawCandidate = serde_yaml::from_value(value).map_err(|e| {
                TrainError::invalid_config(format!("model_selection.{key}: {e}"))
            })?;
            candidates.push(expand_candidate(key, entry)?);
        }
        Ok(Self { cv, candidates })
    }

    /// Total number of parameter combinations across candidates.
    pub fn n_combinations(&self) -> usize {
        self.candidates.iter().map(|c| c.grid.len()).sum()
    }
}

fn key_string(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .map_err(|e| TrainError::invalid_config(e.to_string())),
    }
}

fn expand_candidate(key: String, entry: RawCandidate) -> Result<CandidateSpec> {
    let class: ModelClass = entry.class.parse().map_err(|class| TrainError::UnknownClass {
        module: entry.module.clone().unwrap_or_else(|| key.clone()),
        class,
    })?;

    let combos = cartesian(&entry.search_param_grid).map_err(|message| {
        TrainError::invalid_config(format!("model_selection.{key}.search_param_grid: {message}"))
    })?;

    let grid = combos
        .into_iter()
        .map(|combo| {
            let mut merged = entry.params.clone();
            for (name, value) in combo {
                merged.insert(name, value);
            }
            ModelParams::from_yaml(class, Value::Mapping(merged)).map_err(|message| {
                TrainError::InvalidParams {
                    module: key.clone(),
                    class: class.name().to_string(),
                    message,
                }
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CandidateSpec { key, class, grid })
}

/// Every combination of the grid values, the last key varying fastest.
///
/// An empty grid yields one empty combination.
fn cartesian(grid: &Mapping) -> std::result::Result<Vec<Vec<(Value, Value)>>, String> {
    let mut combos: Vec<Vec<(Value, Value)>> = vec![Vec::new()];
    for (name, values) in grid {
        let Value::Sequence(values) = values else {
            return Err(format!("values for {} must be a list", key_string(name).unwrap_or_default()));
        };
        if values.is_empty() {
            return Err(format!("values for {} are empty", key_string(name).unwrap_or_default()));
        }
        combos = combos
            .into_iter()
            .flat_map(|combo| {
                values.iter().map(move |value| {
                    let mut next = combo.clone();
                    next.push((name.clone(), value.clone()));
                    next
                })
            })
            .collect();
    }
    Ok(combos)
}
