use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cardio_ml_core::ParamSet;
use cardio_ml_model_selection::ParamDistribution;
use cardio_ml_preprocessing::PreprocessorSpec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::csv_io::ensure_parent;
use crate::error::IoResult;

/// Parameter distributions keyed by catalog model name.
pub type ParamCatalog = BTreeMap<String, ParamDistribution>;

/// What is recorded about the selected model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub name: String,
    pub score: f64,
    pub params: ParamSet,
}

/// Serialize `value` as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> IoResult<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> IoResult<T> {
    let json = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&json)?)
}

pub fn load_preprocessor_spec(path: impl AsRef<Path>) -> IoResult<PreprocessorSpec> {
    read_json(path)
}

/// Load `{ "<model name>": { "<step>__<param>": [values...] } }`.
/// Every distribution is validated on load.
pub fn load_param_dists(path: impl AsRef<Path>) -> IoResult<ParamCatalog> {
    let catalog: ParamCatalog = read_json(path)?;
    for dist in catalog.values() {
        dist.validate()?;
    }
    Ok(catalog)
}

pub fn save_model_card(path: impl AsRef<Path>, card: &ModelCard) -> IoResult<()> {
    write_json(path, card)
}

pub fn load_model_card(path: impl AsRef<Path>) -> IoResult<ModelCard> {
    read_json(path)
}
