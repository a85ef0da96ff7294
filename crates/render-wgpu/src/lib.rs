//! wgpu render backend for the cube field.
//!
//! Draws the whole field with one instanced call. The view-projection comes
//! from the camera through [`cubefield_render::RenderView`].
//!
//! # Invariants
//! - Renderer never mutates camera state.
//! - Instance data is uploaded once; only uniforms change per frame.

mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;
