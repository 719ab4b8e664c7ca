//! tree-sitter-go adapters

pub mod bindings_builder;
pub mod lowering;

pub use bindings_builder::BindingsBuilder;
pub use lowering::GoLowering;
