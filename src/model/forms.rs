//! Entry forms for production, price and sales.
//!
//! A form holds the raw text the user typed. Submitting it checks that no required field is empty,
//! upserts the record by date and, only when the write succeeded, clears the form. A rejected or
//! failed submission leaves every field exactly as it was.
//!
//! A field holding only whitespace counts as empty, and values are trimmed before they are
//! stored. This is stricter than a plain emptiness check, so `" "` as a date is rejected instead
//! of becoming a record keyed by a blank date.
//!
//! No numeric validation happens here. The text is bound as-is and the store decides whether it
//! can hold it, so `"ten"` as a quantity comes back as a database error.

use crate::db::Db;
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{PriceRecord, ProductionRecord, SalesRecord, Stored};
use crate::Result;
use anyhow::anyhow;
use chrono::Local;
use tracing::debug;

/// The date portion of an entry form: either typed text or the local calendar date.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DateField {
    Text(String),
    Today,
}

impl DateField {
    /// `today` wins when both are given.
    pub fn new(text: Option<&str>, today: bool) -> Self {
        match (text, today) {
            (_, true) => DateField::Today,
            (Some(s), false) => DateField::Text(s.to_string()),
            (None, false) => DateField::Text(String::new()),
        }
    }

    /// Resolves the field to the text that goes into the form. `Today` becomes `YYYY-MM-DD`.
    pub fn into_text(self) -> String {
        match self {
            DateField::Text(s) => s,
            DateField::Today => Local::now().date_naive().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Returns a validation error naming every field in `fields` whose value is blank.
fn require(entry: &str, fields: &[(&'static str, &str)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(Error::new(
        ErrorType::Validation,
        anyhow!(
            "Please fill in all fields for {entry} entry (missing: {})",
            missing.join(", ")
        ),
    ))
}

/// The production entry form: date, egg type and quantity.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ProductionForm {
    date: String,
    egg_type: String,
    quantity: String,
}

impl ProductionForm {
    pub fn new(
        date: impl Into<String>,
        egg_type: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            egg_type: egg_type.into(),
            quantity: quantity.into(),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn egg_type(&self) -> &str {
        &self.egg_type
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn is_clear(&self) -> bool {
        self.date.is_empty() && self.egg_type.is_empty() && self.quantity.is_empty()
    }

    pub fn clear(&mut self) {
        self.date.clear();
        self.egg_type.clear();
        self.quantity.clear();
    }

    /// Validates, upserts by date, and clears the form on success.
    pub(crate) async fn submit(&mut self, db: &Db) -> Result<Stored<ProductionRecord>> {
        require(
            "production",
            &[
                ("date", &self.date),
                ("type", &self.egg_type),
                ("quantity", &self.quantity),
            ],
        )?;
        let stored = db
            .upsert_production(self.date.trim(), self.egg_type.trim(), self.quantity.trim())
            .await
            .pub_result(ErrorType::Database)?;
        debug!("Stored production record {stored:?}");
        self.clear();
        Ok(stored)
    }
}

/// The price entry form: date and price value.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PriceForm {
    date: String,
    value: String,
}

impl PriceForm {
    pub fn new(date: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            value: value.into(),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_clear(&self) -> bool {
        self.date.is_empty() && self.value.is_empty()
    }

    pub fn clear(&mut self) {
        self.date.clear();
        self.value.clear();
    }

    /// Validates, upserts by date, and clears the form on success.
    pub(crate) async fn submit(&mut self, db: &Db) -> Result<Stored<PriceRecord>> {
        require("price", &[("date", &self.date), ("value", &self.value)])?;
        let stored = db
            .upsert_price(self.date.trim(), self.value.trim())
            .await
            .pub_result(ErrorType::Database)?;
        debug!("Stored price record {stored:?}");
        self.clear();
        Ok(stored)
    }
}

/// The sales entry form: date and quantity sold.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SalesForm {
    date: String,
    quantity: String,
}

impl SalesForm {
    pub fn new(date: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            quantity: quantity.into(),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn is_clear(&self) -> bool {
        self.date.is_empty() && self.quantity.is_empty()
    }

    pub fn clear(&mut self) {
        self.date.clear();
        self.quantity.clear();
    }

    /// Validates, upserts by date, and clears the form on success.
    pub(crate) async fn submit(&mut self, db: &Db) -> Result<Stored<SalesRecord>> {
        require("sales", &[("date", &self.date), ("quantity", &self.quantity)])?;
        let stored = db
            .upsert_sales(self.date.trim(), self.quantity.trim())
            .await
            .pub_result(ErrorType::Database)?;
        debug!("Stored sales record {stored:?}");
        self.clear();
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[test]
    fn test_date_field_text() {
        let field = DateField::new(Some("2024-03-01"), false);
        assert_eq!(field.into_text(), "2024-03-01");
        assert_eq!(DateField::new(None, false).into_text(), "");
    }

    #[test]
    fn test_date_field_today() {
        let text = DateField::new(Some("ignored"), true).into_text();
        assert!(chrono::NaiveDate::parse_from_str(&text, "%Y-%m-%d").is_ok());
    }

    #[tokio::test]
    async fn test_production_submit_clears_form() {
        let env = TestEnv::new().await;
        let mut form = ProductionForm::new("2024-01-01", "A", "10");
        let stored = form.submit(env.config().db()).await.unwrap();
        assert_eq!(stored.record, ProductionRecord::new("2024-01-01", "A", 10));
        assert!(form.is_clear());
    }

    #[tokio::test]
    async fn test_production_submit_replaces_same_date() {
        let env = TestEnv::new().await;
        let db = env.config().db().clone();
        ProductionForm::new("2024-01-01", "A", "10")
            .submit(&db)
            .await
            .unwrap();
        ProductionForm::new("2024-01-01", "B", "7")
            .submit(&db)
            .await
            .unwrap();

        let rows = db.production_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record, ProductionRecord::new("2024-01-01", "B", 7));
    }

    #[tokio::test]
    async fn test_empty_field_is_rejected_without_write() {
        let env = TestEnv::new().await;
        let db = env.config().db().clone();
        let mut form = ProductionForm::new("2024-01-01", "", "10");

        let err = form.submit(&db).await.unwrap_err();

        assert!(err.is_validation());
        assert!(err.to_string().contains("type"));
        assert_eq!(db.count_rows(crate::db::Table::Production).await.unwrap(), 0);
        assert_eq!(form, ProductionForm::new("2024-01-01", "", "10"));
    }

    #[tokio::test]
    async fn test_whitespace_only_field_is_rejected_as_empty() {
        let env = TestEnv::new().await;
        let db = env.config().db().clone();
        let mut form = SalesForm::new("   ", "4");
        let err = form.submit(&db).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(form.date(), "   ");
        assert_eq!(db.count_rows(crate::db::Table::Sales).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_values_are_trimmed_before_storing() {
        let env = TestEnv::new().await;
        let db = env.config().db().clone();
        let mut form = ProductionForm::new(" 2024-01-01 ", " B ", " 7 ");
        let stored = form.submit(&db).await.unwrap();
        assert_eq!(stored.record, ProductionRecord::new("2024-01-01", "B", 7));
    }

    #[tokio::test]
    async fn test_non_numeric_quantity_is_a_database_error() {
        let env = TestEnv::new().await;
        let db = env.config().db().clone();
        let mut form = SalesForm::new("2024-01-01", "ten");

        let err = form.submit(&db).await.unwrap_err();

        assert_eq!(err.error_type(), ErrorType::Database);
        assert_eq!(form.quantity(), "ten");
        assert_eq!(db.count_rows(crate::db::Table::Sales).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negative_quantity_is_a_database_error() {
        let env = TestEnv::new().await;
        let db = env.config().db().clone();
        let mut form = ProductionForm::new("2024-01-01", "A", "-3");
        let err = form.submit(&db).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Database);
        assert!(!form.is_clear());
    }

    #[tokio::test]
    async fn test_price_submit() {
        let env = TestEnv::new().await;
        let mut form = PriceForm::new("2024-01-01", "2.5");
        let stored = form.submit(env.config().db()).await.unwrap();
        assert_eq!(stored.record.price, Decimal::new(25, 1));
        assert!(form.is_clear());
    }

    #[tokio::test]
    async fn test_price_missing_value() {
        let env = TestEnv::new().await;
        let mut form = PriceForm::new("2024-01-01", "");
        let err = form.submit(env.config().db()).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("value"));
        assert_eq!(form.date(), "2024-01-01");
    }
}
