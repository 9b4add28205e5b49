pub mod dubbing;
pub mod job;
pub mod transcript;
