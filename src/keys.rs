//! Sortable object key generation.
//!
//! Uploaded frames are named so that the bucket's default ascending key
//! order lists newest frames first: the key starts with a fixed-width
//! hexadecimal "inverted timestamp" that decreases as wall-clock time
//! increases.

use chrono::{DateTime, Utc};

/// Subtrahend for the inverted-timestamp prefix. Epoch milliseconds fit
/// in well under 60 bits, so the difference always renders as exactly
/// [`SORT_PREFIX_WIDTH`] hex digits.
const KEY_EPOCH_CEILING: u64 = 0xFFF_FFFF_FFFF_FFFF;

/// Width of the hexadecimal sort prefix in characters.
pub const SORT_PREFIX_WIDTH: usize = 15;

/// Render the inverted-timestamp prefix for a point in time.
///
/// Later instants produce lexicographically smaller prefixes, which is
/// what makes ascending key listings come back newest-first.
pub fn sort_prefix(at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis() as u64;
    format!("{:0width$x}", KEY_EPOCH_CEILING - millis, width = SORT_PREFIX_WIDTH)
}

/// Build the full object key for a frame captured at `at`:
/// `<hex prefix>__<YYYY-MM-DD-HH-mm-ss>.png`.
///
/// The millisecond-grained prefix keeps keys unique for any two uploads
/// at least one millisecond apart; the human-readable half is for
/// operators browsing the bucket.
pub fn object_key(at: DateTime<Utc>) -> String {
    format!(
        "{}__{}.png",
        sort_prefix(at),
        at.format("%Y-%m-%d-%H-%M-%S")
    )
}
