pub mod camera;
pub mod color;
pub mod config;
pub mod frame;
pub mod heightfield;
pub mod procgen;
pub mod render;
pub mod viewer;
