pub mod levels;
pub mod wav;
