pub mod metadata;
pub mod slot;
