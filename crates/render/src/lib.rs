//! Rendering Adapter: renderer-agnostic interface over the cube field.
//!
//! # Invariants
//! - Renderers never mutate camera state.
//! - Render state derives from the cube field and the camera's view.

mod field;
mod renderer;

pub use field::CubeField;
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "cubefield-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
