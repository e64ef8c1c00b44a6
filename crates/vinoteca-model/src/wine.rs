// SPDX-License-Identifier: Apache-2.0

use crate::label::LabelEntry;
use serde::{Deserialize, Serialize};

/// One row of the `wine_descriptions` table, read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WineRecord {
    pub id: String,
    pub name: String,
    pub category_1: String,
    /// The matching dimension; one of the 15 category-map display names
    /// when the stores are in sync.
    pub category_2: String,
    pub origin: String,
    pub description: String,
}

/// One sampled (label, wine) pair. Constructed fresh per request, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleResult {
    pub label: LabelEntry,
    pub wine: WineRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wine_record_round_trips_through_json() {
        let wine = WineRecord {
            id: "w1".to_string(),
            name: "Test Wine".to_string(),
            category_1: "Red".to_string(),
            category_2: "Cabernet Sauvignon".to_string(),
            origin: "Chile".to_string(),
            description: "A test pour.".to_string(),
        };
        let json = serde_json::to_string(&wine).expect("serialize");
        let back: WineRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, wine);
    }
}
