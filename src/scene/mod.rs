pub mod backend;
pub mod cpu;
pub mod loader;
pub mod manager;
pub mod mesh;
