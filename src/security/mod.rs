pub mod permission;
pub mod access;
pub mod provider;
pub mod filter;
