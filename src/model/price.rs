use crate::model::{Cell, Stored, TableRow};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The price of an egg on a given date.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Free-text date. Unique within the `egg_prices` table.
    pub date: String,
    /// Never negative.
    pub price: Decimal,
}

impl PriceRecord {
    pub fn new(date: impl Into<String>, price: Decimal) -> Self {
        Self {
            date: date.into(),
            price,
        }
    }
}

impl TableRow for Stored<PriceRecord> {
    const HEADERS: &'static [&'static str] = &["id", "date", "price"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Integer(self.id),
            Cell::Text(self.record.date.clone()),
            Cell::Real(self.record.price.to_f64().unwrap_or_default()),
        ]
    }
}
