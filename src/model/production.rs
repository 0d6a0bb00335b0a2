use crate::model::{Cell, Stored, TableRow};
use serde::{Deserialize, Serialize};

/// One day of egg production for a single egg type.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// Free-text date. Unique within the `egg_production` table.
    pub date: String,
    /// A short category code such as `A`, `B` or `C`.
    #[serde(rename = "type")]
    pub egg_type: String,
    /// Number of eggs produced. Never negative.
    pub quantity: i64,
}

impl ProductionRecord {
    pub fn new(date: impl Into<String>, egg_type: impl Into<String>, quantity: i64) -> Self {
        Self {
            date: date.into(),
            egg_type: egg_type.into(),
            quantity,
        }
    }
}

impl TableRow for Stored<ProductionRecord> {
    const HEADERS: &'static [&'static str] = &["id", "date", "type", "production"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Integer(self.id),
            Cell::Text(self.record.date.clone()),
            Cell::Text(self.record.egg_type.clone()),
            Cell::Integer(self.record.quantity),
        ]
    }
}
