use crate::foundation::error::{BridgeError, BridgeResult};
use std::path::Path;

/// How positional node inputs line up with declared input clips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrdering {
    /// Input `i` feeds the `i`-th declared input clip.
    #[default]
    Declared,
    /// Input `len - 1 - i` feeds the `i`-th declared input clip (legacy host ordering).
    Reversed,
}

/// Options shared by the clip bridges of one host.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeOpts {
    /// Mapping between input clips and node inputs.
    pub input_ordering: InputOrdering,
    /// Maximum number of nested upstream plugin renders per fetch.
    pub max_upstream_depth: usize,
}

impl Default for BridgeOpts {
    fn default() -> Self {
        Self {
            input_ordering: InputOrdering::Declared,
            max_upstream_depth: 64,
        }
    }
}

impl BridgeOpts {
    /// Parse options from JSON, filling unspecified fields with defaults.
    pub fn from_json_str(s: &str) -> BridgeResult<Self> {
        let opts: Self = serde_json::from_str(s)
            .map_err(|e| BridgeError::validation(format!("bridge options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Read and parse a JSON options file.
    pub fn from_path(path: &Path) -> BridgeResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Other(anyhow::Error::new(e).context(format!("read {}", path.display())))
        })?;
        Self::from_json_str(&s)
    }

    /// Reject option values that would make every upstream fetch fail.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.max_upstream_depth == 0 {
            return Err(BridgeError::validation(
                "max_upstream_depth must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clip/opts.rs"]
mod tests;
