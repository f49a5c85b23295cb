//! Fingerprint keys for duplicate detection.
//!
//! Three comparison modes, from cheapest to strictest:
//!
//! - [`ComparisonMode::Name`] keys on the normalized display name. No content
//!   is fetched, so a scan stays metadata-only.
//! - [`ComparisonMode::Content`] keys on the full text, so two items match
//!   only when their content is byte-for-byte identical after UTF-8 decoding.
//! - [`ComparisonMode::Hash`] keys on a 32-bit rolling hash of the text.
//!   Collisions are possible but cheap to bucket; suitable for large trees.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::host::{Host, HostError};

use super::item::Item;

/// How two items are judged to be duplicates of one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// Match on normalized display name.
    Name,
    /// Match on full textual content.
    Content,
    /// Match on a 32-bit content hash.
    Hash,
}

impl std::fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonMode::Name => write!(f, "name"),
            ComparisonMode::Content => write!(f, "content"),
            ComparisonMode::Hash => write!(f, "hash"),
        }
    }
}

/// Normalized name key: Unicode NFC, then lowercased.
///
/// NFC first so that precomposed and decomposed spellings of the same
/// name land in the same bucket.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.nfc().collect::<String>().to_lowercase()
}

/// 32-bit rolling hash of `content`, rendered as fixed-width hex.
///
/// Multiplier 31 over the Unicode scalar values, wrapping. Equal content
/// always produces equal keys; unequal content may collide, which is
/// acceptable because a hash bucket is only a duplicate *candidate* set.
#[must_use]
pub fn content_hash(content: &str) -> String {
    let hash = content
        .chars()
        .fold(0u32, |h, c| h.wrapping_mul(31).wrapping_add(c as u32));
    format!("{hash:08x}")
}

/// Compute the bucketing key for `item` under `mode`.
///
/// Content-bearing modes fetch the item's text through the host on first
/// use and cache it on the item, so hashing after grouping does not fetch
/// twice. A fetch failure is returned to the caller, which excludes the
/// item from grouping rather than aborting the scan.
pub async fn fingerprint_key(
    host: &dyn Host,
    mode: ComparisonMode,
    item: &mut Item,
) -> Result<String, HostError> {
    match mode {
        ComparisonMode::Name => Ok(name_key(&item.display_name)),
        ComparisonMode::Content => Ok(resolve_content(host, item).await?.to_string()),
        ComparisonMode::Hash => {
            let text = resolve_content(host, item).await?;
            Ok(content_hash(text))
        }
    }
}

/// Fetch and cache the item's textual content.
///
/// Document files are exported by id so the host renders their structured
/// body as text; everything else is fetched raw and decoded lossily, which
/// keeps binary files comparable without panicking on invalid UTF-8.
async fn resolve_content<'a>(
    host: &dyn Host,
    item: &'a mut Item,
) -> Result<&'a str, HostError> {
    if item.content.is_none() {
        let text = if item.is_document() {
            host.export_text_content(&item.id).await?
        } else {
            match host.fetch_raw(&item.locator.path).await? {
                Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                None => {
                    return Err(HostError::Decode(format!(
                        "no content at {}",
                        item.locator.path
                    )))
                }
            }
        };
        item.content = Some(text);
    }
    Ok(item.content.as_deref().unwrap_or_default())
}
