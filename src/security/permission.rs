use std::fmt;
use serde::{Serialize, Deserialize};

/// Named bit inside the 64-bit permission space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionType {
    pub index: u8,
    pub name: &'static str,
}

impl PermissionType {
    pub const SEE: PermissionType = PermissionType { index: 0, name: "See" };
    pub const PREVIEW: PermissionType = PermissionType { index: 1, name: "Preview" };
    pub const PREVIEW_WITHOUT_WATERMARK: PermissionType = PermissionType { index: 2, name: "PreviewWithoutWatermark" };
    pub const PREVIEW_WITHOUT_REDACTION: PermissionType = PermissionType { index: 3, name: "PreviewWithoutRedaction" };
    pub const OPEN: PermissionType = PermissionType { index: 4, name: "Open" };
    pub const OPEN_MINOR: PermissionType = PermissionType { index: 5, name: "OpenMinor" };
    pub const SAVE: PermissionType = PermissionType { index: 6, name: "Save" };
    pub const PUBLISH: PermissionType = PermissionType { index: 7, name: "Publish" };
    pub const FORCE_CHECKIN: PermissionType = PermissionType { index: 8, name: "ForceCheckin" };
    pub const ADD_NEW: PermissionType = PermissionType { index: 9, name: "AddNew" };
    pub const APPROVE: PermissionType = PermissionType { index: 10, name: "Approve" };
    pub const DELETE: PermissionType = PermissionType { index: 11, name: "Delete" };
    pub const RECALL_OLD_VERSION: PermissionType = PermissionType { index: 12, name: "RecallOldVersion" };
    pub const DELETE_OLD_VERSION: PermissionType = PermissionType { index: 13, name: "DeleteOldVersion" };
    pub const SEE_PERMISSIONS: PermissionType = PermissionType { index: 14, name: "SeePermissions" };
    pub const SET_PERMISSIONS: PermissionType = PermissionType { index: 15, name: "SetPermissions" };
    pub const RUN_APPLICATION: PermissionType = PermissionType { index: 16, name: "RunApplication" };
    pub const MANAGE_LISTS_AND_WORKSPACES: PermissionType = PermissionType { index: 17, name: "ManageListsAndWorkspaces" };
    pub const TAKE_OWNERSHIP: PermissionType = PermissionType { index: 18, name: "TakeOwnership" };

    /// Every built-in permission, ordered by bit index.
    pub const ALL: [PermissionType; 19] = [
        Self::SEE,
        Self::PREVIEW,
        Self::PREVIEW_WITHOUT_WATERMARK,
        Self::PREVIEW_WITHOUT_REDACTION,
        Self::OPEN,
        Self::OPEN_MINOR,
        Self::SAVE,
        Self::PUBLISH,
        Self::FORCE_CHECKIN,
        Self::ADD_NEW,
        Self::APPROVE,
        Self::DELETE,
        Self::RECALL_OLD_VERSION,
        Self::DELETE_OLD_VERSION,
        Self::SEE_PERMISSIONS,
        Self::SET_PERMISSIONS,
        Self::RUN_APPLICATION,
        Self::MANAGE_LISTS_AND_WORKSPACES,
        Self::TAKE_OWNERSHIP,
    ];

    pub fn mask(&self) -> u64 {
        1u64 << self.index
    }

    /// Case-insensitive lookup in the static table.
    pub fn by_name(name: &str) -> Option<PermissionType> {
        Self::ALL.iter().copied().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn by_index(index: u8) -> Option<PermissionType> {
        Self::ALL.get(index as usize).copied()
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Fixed-width 64-bit permission set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionBits(pub u64);

impl PermissionBits {
    pub const NONE: PermissionBits = PermissionBits(0);

    pub fn of(permissions: &[PermissionType]) -> Self {
        PermissionBits(permissions.iter().fold(0, |bits, p| bits | p.mask()))
    }

    pub fn has(&self, permission: PermissionType) -> bool {
        self.0 & permission.mask() != 0
    }

    pub fn set(&mut self, permission: PermissionType) {
        self.0 |= permission.mask();
    }

    pub fn union(self, other: PermissionBits) -> Self {
        PermissionBits(self.0 | other.0)
    }

    /// `self & !other`
    pub fn except(self, other: PermissionBits) -> Self {
        PermissionBits(self.0 & !other.0)
    }

    pub fn names(&self) -> Vec<&'static str> {
        PermissionType::ALL.iter().filter(|p| self.has(**p)).map(|p| p.name).collect()
    }
}

/// One access control entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AceInfo {
    pub identity: i32,
    pub allow: PermissionBits,
    pub deny: PermissionBits,
}

impl AceInfo {
    pub fn allow(identity: i32, permissions: &[PermissionType]) -> Self {
        AceInfo {
            identity,
            allow: PermissionBits::of(permissions),
            deny: PermissionBits::NONE,
        }
    }

    pub fn deny(identity: i32, permissions: &[PermissionType]) -> Self {
        AceInfo {
            identity,
            allow: PermissionBits::NONE,
            deny: PermissionBits::of(permissions),
        }
    }
}

/// Accumulate allow and deny bits of the entries that belong to one of
/// `identities` and return `allow & !deny`.
pub fn effective_permissions(entries: &[AceInfo], identities: &[i32]) -> PermissionBits {
    let (allow, deny) = entries
        .iter()
        .filter(|ace| identities.contains(&ace.identity))
        .fold((PermissionBits::NONE, PermissionBits::NONE), |(allow, deny), ace| {
            (allow.union(ace.allow), deny.union(ace.deny))
        });
    allow.except(deny)
}
