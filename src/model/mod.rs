//! Types that represent the core data model: the three date-keyed records, the forms that capture
//! them, and the rows that come back out of the store.
mod forms;
mod price;
mod production;
mod revenue;
mod sales;

pub use forms::{DateField, PriceForm, ProductionForm, SalesForm};
pub use price::PriceRecord;
pub use production::ProductionRecord;
pub use revenue::RevenueRow;
pub use sales::SalesRecord;

use serde::{Deserialize, Serialize};

/// A record as it was read back from a table, along with its synthetic `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: i64,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Stored<T> {
    pub fn new(id: i64, record: T) -> Self {
        Self { id, record }
    }
}

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Integer(i64),
    Real(f64),
    Text(String),
    Empty,
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Integer(n) => write!(f, "{n}"),
            Cell::Real(n) => write!(f, "{n}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Empty => Ok(()),
        }
    }
}

/// Something that can be laid out as a row under a fixed set of column headers. The headers match
/// the column order of the backing table.
pub trait TableRow {
    /// The table column names, in table order.
    const HEADERS: &'static [&'static str];

    /// The cell values for this row, in the same order as `HEADERS`.
    fn cells(&self) -> Vec<Cell>;
}
