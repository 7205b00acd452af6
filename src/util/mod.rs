//! Small helpers shared by the document model.
//!
//! - **Text classification**: deciding whether bytes can be stored as
//!   element text or must be base64-encoded, and whether text is markup
//! - **Href resolution**: joining relative `href` values onto a base URI

mod href;
mod text;

pub use href::resolve_href;
pub use text::{as_printable_text, looks_like_markup};
