use std::collections::HashMap;
use parking_lot::RwLock;
use crate::core::error::{Error, Result};
use crate::core::types::NodeId;
use crate::security::permission::AceInfo;

/// Read access to identities and ACLs, owned by the security subsystem
pub trait SecurityProvider: Send + Sync {
    /// The user's own id followed by every group it belongs to.
    fn identities(&self, user_id: i32) -> Result<Vec<i32>>;

    /// Effective (inherited and explicit) entries of a node. Fails with
    /// `NotFound` when the node has no security entry.
    fn entries(&self, node_id: NodeId) -> Result<Vec<AceInfo>>;
}

/// In-memory provider for embedding and tests
#[derive(Default)]
pub struct MemorySecurityProvider {
    memberships: RwLock<HashMap<i32, Vec<i32>>>,
    acls: RwLock<HashMap<NodeId, Vec<AceInfo>>>,
}

impl MemorySecurityProvider {
    pub fn new() -> Self {
        MemorySecurityProvider::default()
    }

    pub fn add_membership(&self, user_id: i32, group_id: i32) {
        let mut memberships = self.memberships.write();
        let groups = memberships.entry(user_id).or_default();
        if !groups.contains(&group_id) {
            groups.push(group_id);
        }
    }

    pub fn set_entries(&self, node_id: NodeId, entries: Vec<AceInfo>) {
        self.acls.write().insert(node_id, entries);
    }

    pub fn add_entry(&self, node_id: NodeId, entry: AceInfo) {
        self.acls.write().entry(node_id).or_default().push(entry);
    }

    pub fn remove_node(&self, node_id: NodeId) {
        self.acls.write().remove(&node_id);
    }
}

impl SecurityProvider for MemorySecurityProvider {
    fn identities(&self, user_id: i32) -> Result<Vec<i32>> {
        let mut ids = vec![user_id];
        if let Some(groups) = self.memberships.read().get(&user_id) {
            ids.extend(groups.iter().copied());
        }
        Ok(ids)
    }

    fn entries(&self, node_id: NodeId) -> Result<Vec<AceInfo>> {
        self.acls
            .read()
            .get(&node_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("no security entry for node {}", node_id)))
    }
}
