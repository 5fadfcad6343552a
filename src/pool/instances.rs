use crate::pool::{ActiveEntityPool, PoolHandle, PoolStats};
use crate::scene::node::SceneNode;
use std::collections::HashMap;

/// One [`ActiveEntityPool`] of scene nodes per template id, created on first use. The factory deep
/// clones the template prototype, released nodes are hidden and moved back to the origin.
#[derive(Debug, Default)]
pub struct InstancePools {
    pools: HashMap<String, ActiveEntityPool<SceneNode>>,
    initial_size: usize,
}

impl InstancePools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-warm size of every pool created from now on.
    pub fn with_initial_size(mut self, initial_size: usize) -> Self {
        self.initial_size = initial_size;
        self
    }

    pub fn acquire(&mut self, template_id: &str, prototype: &SceneNode) -> PoolHandle {
        let initial_size = self.initial_size;
        self.pools
            .entry(template_id.to_string())
            .or_insert_with(|| {
                let prototype = prototype.clone();
                ActiveEntityPool::new(template_id, move || prototype.deep_clone())
                    .with_reset(SceneNode::reset)
                    .with_initial_size(initial_size)
            })
            .acquire()
    }

    pub fn node(&self, template_id: &str, handle: PoolHandle) -> Option<&SceneNode> {
        self.pools.get(template_id)?.get(handle)
    }

    pub fn node_mut(&mut self, template_id: &str, handle: PoolHandle) -> Option<&mut SceneNode> {
        self.pools.get_mut(template_id)?.get_mut(handle)
    }

    pub fn release(&mut self, template_id: &str, handle: PoolHandle) -> bool {
        match self.pools.get_mut(template_id) {
            Some(pool) => pool.release(handle),
            None => {
                log::warn!("No pool for template {}, cannot release {:?}", template_id, handle);
                false
            }
        }
    }

    pub fn release_all(&mut self) -> usize {
        self.pools.values_mut().map(|pool| pool.release_all()).sum()
    }

    pub fn pool(&self, template_id: &str) -> Option<&ActiveEntityPool<SceneNode>> {
        self.pools.get(template_id)
    }

    pub fn stats(&self) -> PoolStats {
        self.pools
            .values()
            .map(|pool| pool.stats())
            .fold(PoolStats::default(), |acc, stats| acc + stats)
    }

    /// Disposes every pool for good, dropping their geometry.
    pub fn dispose(&mut self) {
        for pool in self.pools.values_mut() {
            pool.dispose();
        }
        self.pools.clear();
    }
}
