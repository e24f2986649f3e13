pub mod bitmap;
pub mod color;
pub mod dither;
pub mod options;
pub mod paint;
pub mod particles;
pub mod reveal;
