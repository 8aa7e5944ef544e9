pub mod mesh;
pub mod spin;

pub use spin::Spin;
