//! Percent-encoding for collector query values.
//!
//! The collector expects RFC 3986 data escaping: only the unreserved set
//! (alphanumerics plus `-`, `.`, `_`, `~`) passes through and a space becomes
//! `%20`, never `+`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Every byte outside the RFC 3986 unreserved set.
pub(crate) const DATA_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Escape `s` for use as a query value.
pub(crate) fn escape_data(s: &str) -> String {
    utf8_percent_encode(s, DATA_ENCODE_SET).to_string()
}
