pub mod batch;
pub mod delimited;
pub mod detect;
pub mod error;
pub mod export;
pub mod free_text;
pub mod labeled;
pub mod layout;

pub use batch::{parse_text, ImportOptions, ParsedBatch};
pub use detect::{detect_format, HeaderKind, InputFormat};
pub use error::{ImportError, Result};
pub use export::export_text;
pub use layout::RowLayout;
