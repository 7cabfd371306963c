pub mod artifact;
pub mod config;
pub mod controls;
pub mod crop;
pub mod error;
pub mod meter;
pub mod mode;
pub mod trim;
