pub mod ease;
pub mod motion;
pub mod phase;
pub mod timeline;
