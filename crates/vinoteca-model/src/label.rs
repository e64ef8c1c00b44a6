// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// One listed bottle-label image reference. Immutable once listed; lifetime
/// is one listing snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    /// Raw category code as embedded in the key. Kept unresolved so a code
    /// missing from the category map surfaces at sample time instead of
    /// silently vanishing from the listing.
    pub category: u8,
    /// Opaque object key or file name.
    pub key: String,
}

impl LabelEntry {
    /// Parses a key whose final path segment follows the
    /// `cat_<code>_<rest>` naming convention. Returns `None` for keys
    /// outside the convention.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let name = key.rsplit('/').next()?;
        let rest = name.strip_prefix("cat_")?;
        let code_end = rest.find('_')?;
        let code = rest[..code_end].parse::<u8>().ok()?;
        Some(Self {
            category: code,
            key: key.to_string(),
        })
    }
}
