use serde::{Serialize, Deserialize};
use crate::security::permission::{PermissionBits, PermissionType};

/// Ordered access levels derived from effective permission bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    Denied,
    See,
    Preview,
    Open,
    OpenMinor,
}

impl AccessLevel {
    /// Highest level whose permission bit is set.
    pub fn from_bits(bits: PermissionBits) -> AccessLevel {
        const LEVELS: [(PermissionType, AccessLevel); 4] = [
            (PermissionType::OPEN_MINOR, AccessLevel::OpenMinor),
            (PermissionType::OPEN, AccessLevel::Open),
            (PermissionType::PREVIEW, AccessLevel::Preview),
            (PermissionType::SEE, AccessLevel::See),
        ];
        LEVELS
            .iter()
            .find(|(permission, _)| bits.has(*permission))
            .map(|(_, level)| *level)
            .unwrap_or(AccessLevel::Denied)
    }
}
