//! `ModelInstance` — an ordered list of ware hosts.

use crate::WareHost;

/// Wares in execution order.  The order is fixed when the model is built
/// and never changes during a run.
#[derive(Debug, Default)]
pub struct ModelInstance {
    hosts: Vec<WareHost>,
}

impl ModelInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, host: WareHost) {
        self.hosts.push(host);
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WareHost> {
        self.hosts.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, WareHost> {
        self.hosts.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(WareHost::id)
    }
}
