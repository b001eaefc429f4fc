use crate::clip::opts::InputOrdering;
use crate::foundation::error::{BridgeError, BridgeResult};

/// Bijection between declared input clip names and positional node inputs.
///
/// Clip `k` (declaration order) maps to input `k` under [`InputOrdering::Declared`] and to input
/// `len - 1 - k` under [`InputOrdering::Reversed`]. Both directions are total over `0..len`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputMap {
    names: Vec<String>,
    ordering: InputOrdering,
}

impl InputMap {
    /// Build a map over `names`; duplicate clip names would break the bijection and are rejected.
    pub fn new(names: Vec<String>, ordering: InputOrdering) -> BridgeResult<Self> {
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(BridgeError::validation(format!(
                    "duplicate input clip name '{name}'"
                )));
            }
        }
        Ok(Self { names, ordering })
    }

    /// Number of input clips.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Return `true` when the effect declares no input clips.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn flip(&self, i: usize) -> usize {
        match self.ordering {
            InputOrdering::Declared => i,
            InputOrdering::Reversed => self.names.len() - 1 - i,
        }
    }

    /// Node input index feeding `clip_name`, `None` for unknown names.
    pub fn input_index(&self, clip_name: &str) -> Option<usize> {
        let k = self.names.iter().position(|n| n == clip_name)?;
        Some(self.flip(k))
    }

    /// Clip name fed by node input `index`.
    pub fn clip_name(&self, index: usize) -> Option<&str> {
        if index >= self.names.len() {
            return None;
        }
        Some(self.names[self.flip(index)].as_str())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clip/input_map.rs"]
mod tests;
