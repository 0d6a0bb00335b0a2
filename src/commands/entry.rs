//! Entry command handlers: production, price and sales.
//!
//! Each handler fills the matching form from the command-line arguments, submits it, and on
//! success redraws the chart that depends on the table it wrote to.

use crate::args::{DateArgs, PriceArgs, ProductionArgs, SalesArgs};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{
    DateField, PriceForm, PriceRecord, ProductionForm, ProductionRecord, SalesForm, SalesRecord,
    Stored,
};
use crate::report::{self, ChartKind};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::path::PathBuf;

/// What a successful entry produced: the stored record and the chart that was redrawn.
#[derive(Debug, Clone, Serialize)]
pub struct Entry<T>
where
    T: Serialize + Clone + Debug,
{
    pub record: Stored<T>,
    pub chart: PathBuf,
}

fn date_text(args: &DateArgs) -> String {
    DateField::new(args.date(), args.today()).into_text()
}

async fn refresh(config: &Config, kind: ChartKind) -> Result<PathBuf> {
    report::refresh(config, kind)
        .await
        .pub_result(ErrorType::Chart)
}

/// Upserts the production record for a date and redraws the production chart.
///
/// # Errors
///
/// - A validation error if the date, type or quantity is empty. Nothing is written.
/// - A database error if the store rejects the values, e.g. a non-numeric or negative quantity.
pub async fn add_production(
    config: Config,
    args: ProductionArgs,
) -> Result<Out<Entry<ProductionRecord>>> {
    let mut form = ProductionForm::new(date_text(args.date()), args.egg_type(), args.quantity());
    let record = form.submit(config.db()).await?;
    let chart = refresh(&config, ChartKind::Production).await?;
    Ok(Out::new(
        "Production entry added successfully.",
        Entry { record, chart },
    ))
}

/// Upserts the price for a date and redraws the revenue chart.
///
/// # Errors
///
/// - A validation error if the date or value is empty. Nothing is written.
/// - A database error if the store rejects the value.
pub async fn set_price(config: Config, args: PriceArgs) -> Result<Out<Entry<PriceRecord>>> {
    let mut form = PriceForm::new(date_text(args.date()), args.value());
    let record = form.submit(config.db()).await?;
    let chart = refresh(&config, ChartKind::Revenue).await?;
    Ok(Out::new(
        "Price entry added successfully.",
        Entry { record, chart },
    ))
}

/// Upserts the sales record for a date and redraws the sales chart.
///
/// # Errors
///
/// - A validation error if the date or quantity is empty. Nothing is written.
/// - A database error if the store rejects the quantity.
pub async fn add_sales(config: Config, args: SalesArgs) -> Result<Out<Entry<SalesRecord>>> {
    let mut form = SalesForm::new(date_text(args.date()), args.quantity());
    let record = form.submit(config.db()).await?;
    let chart = refresh(&config, ChartKind::Sales).await?;
    Ok(Out::new(
        "Sales entry added successfully.",
        Entry { record, chart },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Table;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    fn on(date: &str) -> DateArgs {
        DateArgs::new(Some(date.to_string()), false)
    }

    #[tokio::test]
    async fn test_add_production_refreshes_chart() {
        let env = TestEnv::new().await;
        let out = add_production(env.config(), ProductionArgs::new(on("2024-01-01"), "A", "10"))
            .await
            .unwrap();

        assert_eq!(out.message(), "Production entry added successfully.");
        let entry = out.structure().unwrap();
        assert_eq!(
            entry.record.record,
            ProductionRecord::new("2024-01-01", "A", 10)
        );
        assert_eq!(entry.chart, env.config().charts().join("production.html"));
        assert!(entry.chart.is_file());
    }

    #[tokio::test]
    async fn test_add_production_twice_replaces() {
        let env = TestEnv::new().await;
        add_production(env.config(), ProductionArgs::new(on("2024-01-01"), "A", "10"))
            .await
            .unwrap();
        add_production(env.config(), ProductionArgs::new(on("2024-01-01"), "B", "12"))
            .await
            .unwrap();

        let rows = env.config().db().production_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record, ProductionRecord::new("2024-01-01", "B", 12));
    }

    #[tokio::test]
    async fn test_add_production_missing_field() {
        let env = TestEnv::new().await;
        let err = add_production(env.config(), ProductionArgs::new(on("2024-01-01"), "A", ""))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(
            env.config().db().count_rows(Table::Production).await.unwrap(),
            0
        );
        assert!(!env.config().charts().join("production.html").exists());
    }

    #[tokio::test]
    async fn test_set_price_refreshes_revenue_chart() {
        let env = TestEnv::new().await;
        let out = set_price(env.config(), PriceArgs::new(on("2024-01-01"), "2.5"))
            .await
            .unwrap();
        let entry = out.structure().unwrap();
        assert_eq!(entry.record.record.price, Decimal::new(25, 1));
        assert_eq!(entry.chart, env.config().charts().join("revenue.html"));
    }

    #[tokio::test]
    async fn test_add_sales_with_today() {
        let env = TestEnv::new().await;
        let out = add_sales(env.config(), SalesArgs::new(DateArgs::new(None, true), "30"))
            .await
            .unwrap();
        let entry = out.structure().unwrap();
        assert_eq!(entry.record.record.quantity, 30);
        assert!(!entry.record.record.date.is_empty());
        assert_eq!(entry.chart, env.config().charts().join("sales.html"));
    }

    #[tokio::test]
    async fn test_add_sales_without_date() {
        let env = TestEnv::new().await;
        let err = add_sales(env.config(), SalesArgs::new(DateArgs::default(), "30"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("date"));
    }

    #[tokio::test]
    async fn test_add_sales_non_numeric() {
        let env = TestEnv::new().await;
        let err = add_sales(env.config(), SalesArgs::new(on("2024-01-01"), "lots"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Database);
        assert!(err.to_string().contains("Error adding sales entry"));
    }

    #[tokio::test]
    async fn test_revenue_overflow_is_reported_not_fatal() {
        let env = TestEnv::new().await;
        add_production(
            env.config(),
            ProductionArgs::new(on("2024-01-01"), "A", "100000000000"),
        )
        .await
        .unwrap();

        let err = set_price(env.config(), PriceArgs::new(on("2024-01-01"), "1e19"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Chart);
        assert!(err.to_string().contains("overflows"));

        let err = crate::commands::list(
            env.config(),
            crate::args::ListArgs::new(
                crate::args::ListTarget::Revenue,
                crate::commands::ListFormat::Json,
            ),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Database);
    }

    #[tokio::test]
    async fn test_unrepresentable_price_is_not_kept() {
        let env = TestEnv::new().await;
        let err = set_price(env.config(), PriceArgs::new(on("2024-01-01"), "1e30"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Database);
        assert_eq!(env.config().db().count_rows(Table::Prices).await.unwrap(), 0);

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("farm.xlsx");
        crate::commands::export(env.config(), crate::args::ExportArgs::new(Some(path.clone())))
            .await
            .unwrap();
        assert!(path.is_file());
    }
}
