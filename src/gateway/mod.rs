//! Gateway status objects and best-effort typed extraction.
//!
//! Gateway objects are owned by another component and arrive as loosely
//! structured JSON. Only `status.haStatus` and `status.connections` are
//! consumed; every other field is ignored. Extraction never panics: a missing
//! or mistyped field surfaces as an [`ExtractError`] that callers log and skip.

mod object;
mod status;

pub use object::*;
pub use status::*;
