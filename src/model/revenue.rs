use crate::error::Res;
use crate::model::{Cell, TableRow};
use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One production date joined with the sales and price recorded for the same date.
///
/// Revenue is `production * price`, or zero when no price exists for the date. The sales quantity
/// is carried along but does not take part in the revenue figure. A product too large for
/// `Decimal` is an error rather than a saturated or wrapped value.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RevenueRow {
    pub date: String,
    pub production: i64,
    pub sales: Option<i64>,
    pub price: Option<Decimal>,
    pub revenue: Decimal,
}

impl RevenueRow {
    pub fn new(
        date: impl Into<String>,
        production: i64,
        sales: Option<i64>,
        price: Option<Decimal>,
    ) -> Res<Self> {
        let date = date.into();
        let revenue = match price {
            Some(p) => Decimal::from(production).checked_mul(p).with_context(|| {
                format!("Revenue for '{date}' overflows: {production} eggs at a price of {p}")
            })?,
            None => Decimal::ZERO,
        };
        Ok(Self {
            date,
            production,
            sales,
            price,
            revenue,
        })
    }
}

impl TableRow for RevenueRow {
    const HEADERS: &'static [&'static str] = &["date", "production", "sales", "price", "revenue"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.date.clone()),
            Cell::Integer(self.production),
            self.sales.map(Cell::Integer).unwrap_or(Cell::Empty),
            self.price
                .and_then(|p| p.to_f64())
                .map(Cell::Real)
                .unwrap_or(Cell::Empty),
            Cell::Real(self.revenue.to_f64().unwrap_or_default()),
        ]
    }
}
