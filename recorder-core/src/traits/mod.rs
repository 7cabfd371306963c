pub mod capture_device;
pub mod delegate;
pub mod player;
pub mod trim_encoder;
