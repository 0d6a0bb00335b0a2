use crate::model::{Cell, Stored, TableRow};
use serde::{Deserialize, Serialize};

/// The number of eggs sold on a given date.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: String,
    pub quantity: i64,
}

impl SalesRecord {
    pub fn new(date: impl Into<String>, quantity: i64) -> Self {
        Self {
            date: date.into(),
            quantity,
        }
    }
}

impl TableRow for Stored<SalesRecord> {
    const HEADERS: &'static [&'static str] = &["id", "date", "quantity"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Integer(self.id),
            Cell::Text(self.record.date.clone()),
            Cell::Integer(self.record.quantity),
        ]
    }
}
