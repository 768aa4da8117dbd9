pub mod key_generation;
pub mod node;
