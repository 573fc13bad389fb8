//! Asset resolution and validation.
//!
//! ```text
//! url ──resolve──▶ AssetLocation ──validate──▶ size
//! ```

mod error;
mod kind;
mod resolve;
mod validate;

pub use error::{AssetError, format_size};
pub use kind::AssetKind;
pub use resolve::{AssetLocation, AssetResolver};
pub use validate::Validator;
