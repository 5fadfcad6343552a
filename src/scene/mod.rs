pub mod node;
pub mod template;
pub mod types;
