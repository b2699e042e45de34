pub mod domain;
pub mod error;
pub mod extract;

pub use domain::*;
pub use error::CoreError;
