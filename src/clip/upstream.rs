use crate::clip::bridge::{ClipId, OUTPUT_CLIP_NAME};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::host::traits::{HostNode, Producer};
use std::collections::HashMap;
use std::sync::Arc;

/// Depth-first walk over the plugin nodes feeding one upstream node.
///
/// Plugin nodes are identified by their output clip. Native nodes end a branch, since their rows
/// never trigger a plugin render. The walk only reads the graph, so concurrent fetches on any
/// thread see the same answer.
pub(crate) struct UpstreamWalk {
    max_depth: usize,
    path: Vec<(ClipId, String)>,
    done: HashMap<ClipId, usize>,
}

impl UpstreamWalk {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            path: Vec::new(),
            done: HashMap::new(),
        }
    }

    /// Number of nested plugin renders a fetch from `node` triggers, counting `node` itself.
    ///
    /// Fails with [`BridgeError::Cycle`] when a plugin feeds back into itself and with
    /// [`BridgeError::DepthExceeded`] when the longest plugin chain is deeper than `max_depth`.
    pub(crate) fn plugin_depth(&mut self, node: &Arc<dyn HostNode>) -> BridgeResult<usize> {
        let Producer::OpenFx(effect) = node.producer() else {
            return Ok(0);
        };
        let Some(output) = effect.clip(OUTPUT_CLIP_NAME) else {
            return Ok(1);
        };
        let id = output.id();

        if let Some(pos) = self.path.iter().position(|(p, _)| *p == id) {
            let mut chain: Vec<&str> = self.path[pos..].iter().map(|(_, n)| n.as_str()).collect();
            chain.push(node.name());
            return Err(BridgeError::Cycle(chain.join(" -> ")));
        }
        if let Some(&depth) = self.done.get(&id) {
            return self.check(depth);
        }
        self.check(1)?;

        self.path.push((id, node.name().to_string()));
        let mut deepest = 0;
        for index in 0..node.input_clip_names().len() {
            if let Some(input) = node.input(index) {
                deepest = deepest.max(self.plugin_depth(&input)?);
            }
        }
        self.path.pop();

        let depth = deepest + 1;
        self.done.insert(id, depth);
        self.check(depth)
    }

    fn check(&self, depth: usize) -> BridgeResult<usize> {
        if self.path.len() + depth > self.max_depth {
            return Err(BridgeError::DepthExceeded(self.max_depth));
        }
        Ok(depth)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clip/upstream.rs"]
mod tests;
