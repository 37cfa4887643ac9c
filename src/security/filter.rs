use std::sync::Arc;
use tracing::{trace, warn};
use crate::core::error::{ErrorKind, Result};
use crate::core::types::{NodeId, SYSTEM_IDENTITY};
use crate::schema::schema::QueryFieldLevel;
use crate::security::access::AccessLevel;
use crate::security::permission::{effective_permissions, PermissionBits, PermissionType};
use crate::security::provider::SecurityProvider;

/// Per-candidate visibility decision used by the executor
pub trait PermissionFilter: Send + Sync {
    fn is_permitted(&self, node_id: NodeId, is_last_public: bool, is_last_draft: bool) -> bool;

    /// True when every document is visible, letting the executor skip
    /// filtering altogether.
    fn is_unrestricted(&self) -> bool {
        false
    }
}

/// Filter that lets everything through
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionFilter for AllowAll {
    fn is_permitted(&self, _node_id: NodeId, _is_last_public: bool, _is_last_draft: bool) -> bool {
        true
    }

    fn is_unrestricted(&self) -> bool {
        true
    }
}

/// ACL bitmask filter for one user and one query
pub struct AclPermissionFilter {
    provider: Arc<dyn SecurityProvider>,
    pub user_id: i32,
    pub all_versions: bool,
    pub field_level: QueryFieldLevel,
    identities: Vec<i32>,
}

impl AclPermissionFilter {
    /// Resolves the user's identities once. A failed resolution leaves the
    /// identity list empty, so nothing beyond the sentinel rules is visible.
    pub fn new(
        provider: Arc<dyn SecurityProvider>,
        user_id: i32,
        all_versions: bool,
        field_level: QueryFieldLevel,
    ) -> Self {
        let identities = if user_id < SYSTEM_IDENTITY {
            Vec::new()
        } else {
            provider.identities(user_id).unwrap_or_else(|err| {
                warn!(user_id, error = %err, "identity resolution failed");
                Vec::new()
            })
        };
        AclPermissionFilter {
            provider,
            user_id,
            all_versions,
            field_level,
            identities,
        }
    }

    fn effective_bits(&self, node_id: NodeId) -> Result<PermissionBits> {
        let entries = self.provider.entries(node_id)?;
        Ok(effective_permissions(&entries, &self.identities))
    }

    /// Access level and effective bits of the current user on a node.
    /// Resolution failures resolve to `Denied`.
    pub fn access(&self, node_id: NodeId) -> (AccessLevel, PermissionBits) {
        if self.user_id == SYSTEM_IDENTITY {
            return (AccessLevel::OpenMinor, PermissionBits(u64::MAX));
        }
        if self.user_id < SYSTEM_IDENTITY {
            return (AccessLevel::Denied, PermissionBits::NONE);
        }
        match self.effective_bits(node_id) {
            Ok(bits) => (AccessLevel::from_bits(bits), bits),
            Err(err) if err.kind() == ErrorKind::NotFound => (AccessLevel::Denied, PermissionBits::NONE),
            Err(err) => {
                warn!(node_id = node_id.value(), user_id = self.user_id, error = %err, "permission resolution failed");
                (AccessLevel::Denied, PermissionBits::NONE)
            }
        }
    }
}

impl PermissionFilter for AclPermissionFilter {
    fn is_permitted(&self, node_id: NodeId, is_last_public: bool, is_last_draft: bool) -> bool {
        let (level, bits) = self.access(node_id);
        let head_only = self.field_level <= QueryFieldLevel::HeadOnly;
        let no_binary = self.field_level <= QueryFieldLevel::NoBinaryOrFullText;
        let old_versions = bits.has(PermissionType::RECALL_OLD_VERSION);

        let permitted = match (level, self.all_versions) {
            (AccessLevel::Denied, _) => false,
            (AccessLevel::See, false) => is_last_public && head_only,
            (AccessLevel::Preview, false) => is_last_public && no_binary,
            (AccessLevel::See, true) => is_last_public && head_only && old_versions,
            (AccessLevel::Preview, true) => is_last_public && no_binary && old_versions,
            (AccessLevel::Open, _) => is_last_public,
            (AccessLevel::OpenMinor, false) => is_last_draft,
            (AccessLevel::OpenMinor, true) => true,
        };
        if !permitted {
            trace!(node_id = node_id.value(), level = ?level, "candidate denied");
        }
        permitted
    }

    fn is_unrestricted(&self) -> bool {
        self.user_id == SYSTEM_IDENTITY
    }
}
