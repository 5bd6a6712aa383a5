pub mod msi;
pub mod registry;
