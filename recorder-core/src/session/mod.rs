pub mod capture;
pub mod crop;
pub mod metering;
pub mod playback;
pub mod recorder;
pub mod ticker;
pub mod trim;
