pub mod dubbing;
pub mod languages;
pub mod store;
pub mod translate;
pub mod video;
pub mod voice;
