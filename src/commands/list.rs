//! The `list` command: print a table, or the revenue rows, in one of three formats.

use crate::args::{ListArgs, ListTarget};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult, Res};
use crate::export::Sheet;
use crate::model::Cell;
use crate::{Config, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// How the `list` command lays out its rows.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ListFormat {
    /// A JSON array of objects keyed by column name.
    Json,
    /// A markdown table.
    #[default]
    Table,
    /// CSV with a header row.
    Csv,
}

serde_plain::derive_display_from_serialize!(ListFormat);
serde_plain::derive_fromstr_from_deserialize!(ListFormat);

/// Listed rows in the requested output format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rows {
    Json(serde_json::Value),
    Table(String),
    Csv(String),
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => write!(f, "Rows::Json({v:?})"),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => match serde_json::to_string_pretty(v) {
                Ok(s) => write!(f, "{s}"),
                Err(_) => write!(f, "{v:?}"),
            },
            Rows::Table(s) => write!(f, "{s}"),
            Rows::Csv(s) => write!(f, "{s}"),
        }
    }
}

impl Rows {
    fn from_sheet(sheet: &Sheet, format: ListFormat) -> Res<Self> {
        Ok(match format {
            ListFormat::Json => Rows::Json(to_json(sheet)),
            ListFormat::Table => Rows::Table(to_markdown(sheet)),
            ListFormat::Csv => Rows::Csv(to_csv(sheet)?),
        })
    }
}

/// Reads the rows of `args.target()` in query order and formats them.
pub async fn list(config: Config, args: ListArgs) -> Result<Out<Rows>> {
    let sheet = read(&config, args.target())
        .await
        .pub_result(ErrorType::Database)?;
    let rows = Rows::from_sheet(&sheet, args.format()).pub_result(ErrorType::Internal)?;
    Ok(Out::new(
        format!("Listed {} {} rows", sheet.rows.len(), args.target()),
        rows,
    ))
}

async fn read(config: &Config, target: ListTarget) -> Res<Sheet> {
    let db = config.db();
    let name = target.to_string();
    Ok(match target {
        ListTarget::Production => Sheet::from_rows(name, &db.production_rows().await?),
        ListTarget::Prices => Sheet::from_rows(name, &db.price_rows().await?),
        ListTarget::Sales => Sheet::from_rows(name, &db.sales_rows().await?),
        ListTarget::Revenue => Sheet::from_rows(name, &db.revenue_rows().await?),
    })
}

fn to_json(sheet: &Sheet) -> serde_json::Value {
    let rows = sheet
        .rows
        .iter()
        .map(|row| {
            let object = sheet
                .headers
                .iter()
                .zip(row)
                .map(|(h, c)| (h.clone(), cell_json(c)))
                .collect::<serde_json::Map<_, _>>();
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(rows)
}

fn cell_json(cell: &Cell) -> serde_json::Value {
    match cell {
        Cell::Integer(n) => serde_json::Value::from(*n),
        Cell::Real(n) => serde_json::Value::from(*n),
        Cell::Text(s) => serde_json::Value::from(s.as_str()),
        Cell::Empty => serde_json::Value::Null,
    }
}

fn to_markdown(sheet: &Sheet) -> String {
    let mut out = String::new();
    out.push_str(&markdown_line(sheet.headers.iter().map(String::as_str)));
    out.push_str(&markdown_line(sheet.headers.iter().map(|_| "---")));
    for row in &sheet.rows {
        let cells: Vec<String> = row.iter().map(|c| c.to_string().replace('|', "\\|")).collect();
        out.push_str(&markdown_line(cells.iter().map(String::as_str)));
    }
    out
}

fn markdown_line<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let joined: Vec<&str> = cells.collect();
    format!("| {} |\n", joined.join(" | "))
}

fn to_csv(sheet: &Sheet) -> Res<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&sheet.headers)
        .context("Unable to write the CSV header")?;
    for row in &sheet.rows {
        writer
            .write_record(row.iter().map(|c| c.to_string()))
            .context("Unable to write a CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to flush CSV output: {e}"))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_list_production_table() {
        let env = TestEnv::new().await;
        env.insert_sample_data().await;

        let out = list(
            env.config(),
            ListArgs::new(ListTarget::Production, ListFormat::Table),
        )
        .await
        .unwrap();

        let text = out.structure().unwrap().to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("| id | date | type | production |"));
        assert_eq!(lines.next(), Some("| --- | --- | --- | --- |"));
        assert_eq!(lines.next(), Some("| 1 | 2024-01-01 | A | 10 |"));
    }

    #[tokio::test]
    async fn test_list_prices_json() {
        let env = TestEnv::new().await;
        env.insert_sample_data().await;

        let out = list(env.config(), ListArgs::new(ListTarget::Prices, ListFormat::Json))
            .await
            .unwrap();

        let Rows::Json(value) = out.structure().unwrap() else {
            panic!("expected JSON rows");
        };
        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["date"], "2024-01-01");
        assert_eq!(first["price"], 2.5);
        assert_eq!(first["id"], 1);
    }

    #[tokio::test]
    async fn test_list_revenue_csv() {
        let env = TestEnv::new().await;
        env.insert_sample_data().await;

        let out = list(env.config(), ListArgs::new(ListTarget::Revenue, ListFormat::Csv))
            .await
            .unwrap();

        let text = out.structure().unwrap().to_string();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["date", "production", "sales", "price", "revenue"]
        );
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[0], "2024-01-01");
        assert_eq!(&first[4], "25");
    }

    #[tokio::test]
    async fn test_list_empty_table() {
        let env = TestEnv::new().await;
        let out = list(env.config(), ListArgs::new(ListTarget::Sales, ListFormat::Json))
            .await
            .unwrap();
        assert_eq!(out.message(), "Listed 0 sales rows");
        assert_eq!(out.structure().unwrap().to_string(), "[]");
    }
}
