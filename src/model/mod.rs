//! Domain model types (pure).
//!
//! Item identity and the error taxonomy. Layout geometry lives in
//! [`crate::layout`].

pub mod error;
pub mod identifiers;

pub use error::{
    AppError, ConfigurationError, EngineError, ParseError, PullError, SourceError,
};
pub use identifiers::{InvalidItemId, ItemId, ItemSpec};
