// Models module for catalog data structures
pub mod identifier;
pub mod metadata;
pub mod metric;
pub mod simulations;
pub mod table;
