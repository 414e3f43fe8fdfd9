//! Host triplet derivation, flavor conventions, and tool discovery.

pub mod flavor;
pub mod tools;
pub mod triplet;
