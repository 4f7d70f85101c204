//! Rendering-side math
//!
//! Drawing is left to the host application; this module only produces the
//! matrices a renderer needs for each viewpoint.

pub mod camera;

pub use camera::Camera;
