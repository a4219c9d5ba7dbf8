//! different utility modules used throughout the project
/// solver settings with defaults, loaded from TOML
pub mod config;
/// terminal (and optionally file) logger set up through simplelog
pub mod logger;
/// time spent in every phase of a solve, printed as a table
pub mod timer;
