pub mod composite;
pub mod engine;
pub mod normalize;
pub mod padding;
pub mod tensor;
pub mod tiling;
