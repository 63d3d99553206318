//! Command implementations for the Plume CLI.

pub mod brand;
pub mod generate;
pub mod image;
pub mod providers;
