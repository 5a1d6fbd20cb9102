use crate::{
    error::{CoordinateError, Result},
    point::DEFAULT_STEP_SIZE,
    sequence_walker::WalkSettings,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    /// Step size for points created without an explicit one.
    pub default_step_size: i64,
    pub walk: WalkSettings,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            default_step_size: DEFAULT_STEP_SIZE,
            walk: WalkSettings::default(),
        }
    }
}

impl ModelParameters {
    pub fn validate(&self) -> Result<()> {
        if self.default_step_size < 1 {
            return Err(CoordinateError::InvalidConfiguration(format!(
                "default step size must be positive, got {}",
                self.default_step_size
            )));
        }
        self.walk.validate()
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read parameter file '{path}'"))?;
        let ret: Self = serde_json::from_str(&text)
            .with_context(|| format!("Could not parse parameter JSON '{path}'"))?;
        ret.validate()?;
        Ok(ret)
    }

    pub fn save_to_path(&self, path: &str) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self).context("Could not serialize parameters")?;
        std::fs::write(path, text)
            .with_context(|| format!("Could not write parameter file '{path}'"))
    }
}
