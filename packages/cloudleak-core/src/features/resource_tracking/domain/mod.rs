pub mod record;

pub use record::{Annotation, LexicalScope, NameOrigin, ResourceRecord, VariableId};
