#![deny(unused_crate_dependencies)]

pub mod cache;
pub mod device;
pub mod error;
pub mod events;
pub mod fs;
pub mod manifest;
pub mod storage;

pub use vaultfs_primitives as primitives;
