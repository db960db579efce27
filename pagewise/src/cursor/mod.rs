//! Cursor tokens and keyset seeking
//!
//! A cursor records the sort-field values of the last row on a page. The
//! next page is every row that sorts strictly after those values.

mod codec;
mod predicate;

pub use codec::{CursorCodec, CursorValues, JsonBase64Codec};
pub use predicate::seek_predicate;
