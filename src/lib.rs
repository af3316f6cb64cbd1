// sxscatalog - tools for the SXS catalog of numerical-relativity simulations
// Core library functionality

pub mod cli;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use models::*;
pub use services::*;
