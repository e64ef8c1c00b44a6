// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

pub const CATEGORY_CODE_MIN: u8 = 1;
pub const CATEGORY_CODE_MAX: u8 = 15;

/// The 15 `category_2` display names, indexed by category code minus one.
///
/// This table is the join key between the label index (integer codes embedded
/// in object keys) and the wine catalog (`category_2` column). Additions or
/// renames must land on both stores and this table at once.
const CATEGORY_NAMES: [&str; 15] = [
    "Pinot Noir",
    "Cabernet Sauvignon",
    "Chardonnay",
    "Merlot",
    "Sauvignon Blanc",
    "Riesling",
    "Syrah",
    "Zinfandel",
    "Malbec",
    "Red Blend",
    "White Blend",
    "Sparkling Blend",
    "Pinot Gris",
    "Sangiovese",
    "Tempranillo",
];

/// A category code appeared in the label index without a matching table
/// entry. This is a data-integrity error, not an operational one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct UnknownCategory(pub u8);

impl Display for UnknownCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "category code {} has no category-map entry", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

/// Fixed bijection between category codes and display names. Domain data
/// with no runtime mutation.
pub struct CategoryMap;

impl CategoryMap {
    /// Total over `1..=15`; anything else is `UnknownCategory`.
    pub fn lookup(code: u8) -> Result<&'static str, UnknownCategory> {
        if (CATEGORY_CODE_MIN..=CATEGORY_CODE_MAX).contains(&code) {
            Ok(CATEGORY_NAMES[usize::from(code - 1)])
        } else {
            Err(UnknownCategory(code))
        }
    }

    /// Reverse lookup, for fixtures and migration tooling.
    #[must_use]
    pub fn code_for(name: &str) -> Option<u8> {
        CATEGORY_NAMES
            .iter()
            .position(|n| *n == name)
            .and_then(|ix| u8::try_from(ix + 1).ok())
    }

    pub fn entries() -> impl Iterator<Item = (u8, &'static str)> {
        CATEGORY_NAMES
            .iter()
            .enumerate()
            .map(|(ix, name)| (ix as u8 + 1, *name))
    }
}
