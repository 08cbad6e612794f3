//! Query functions, one module per table family.

pub mod items;
pub mod plans;
pub mod resources;
