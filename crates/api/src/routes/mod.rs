pub mod allocation;
pub mod ops;
