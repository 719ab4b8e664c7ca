pub mod frontend;

pub use frontend::{parse_go, GoFrontend};
