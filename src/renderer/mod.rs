pub mod camera;
pub mod gpu;
pub mod passes;

pub use gpu::{GpuState, RendererError};
