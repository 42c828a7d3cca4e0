//! Core geometric types shared by culling and the render bin.

pub mod bounding;

pub use bounding::{BoundingBox, BoundingSphere};
