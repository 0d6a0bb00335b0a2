//! Production, sales and revenue reports.
//!
//! A report is the data behind one line chart. It is rebuilt from the tables every time it is
//! shown: rows are taken in query order, with no sorting or aggregation across dates. The chart
//! itself is an ECharts option built with `charming`, rendered either to a standalone HTML page or
//! to the raw option JSON.

use crate::db::Db;
use crate::error::Res;
use crate::model::{ProductionRecord, RevenueRow, SalesRecord, Stored};
use crate::{utils, Config};
use anyhow::{anyhow, Context};
use charming::component::{Axis, Legend, Title};
use charming::element::{AxisType, ItemStyle, Tooltip, Trigger};
use charming::series::Line;
use charming::{Chart, HtmlRenderer};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Line colors for the default categories. Any other category gets the ECharts palette.
const CATEGORY_COLORS: [(&str, &str); 3] = [("A", "blue"), ("B", "green"), ("C", "red")];
const SALES_COLOR: &str = "green";
const REVENUE_COLOR: &str = "orange";

/// Which report to build.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Production,
    Sales,
    Revenue,
}

serde_plain::derive_display_from_serialize!(ChartKind);
serde_plain::derive_fromstr_from_deserialize!(ChartKind);

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Production, ChartKind::Sales, ChartKind::Revenue];

    /// The file name used when the chart is refreshed into the charts directory.
    pub fn file_name(&self, format: ChartFormat) -> String {
        format!("{self}.{}", format.extension())
    }
}

/// How a chart is written out.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ChartFormat {
    /// A standalone page that loads ECharts and draws the chart.
    #[default]
    Html,
    /// The ECharts option object only.
    Json,
}

serde_plain::derive_display_from_serialize!(ChartFormat);
serde_plain::derive_fromstr_from_deserialize!(ChartFormat);

impl ChartFormat {
    fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Html => "html",
            ChartFormat::Json => "json",
        }
    }
}

/// Production quantities of one category, aligned with `ProductionChart::dates`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategorySeries {
    pub category: String,
    pub quantities: Vec<i64>,
}

/// One series per category over the dates seen in the production table.
///
/// Every series has exactly one entry per distinct date. On a given date a category gets the
/// recorded quantity if that date's row is of its type, and zero otherwise.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProductionChart {
    pub dates: Vec<String>,
    pub series: Vec<CategorySeries>,
}

impl ProductionChart {
    /// Builds the chart from `rows` in the order given.
    ///
    /// The categories are `seeds` followed by every other egg type found in `rows`, in first-seen
    /// order, so a type that is not among the seeds still gets its own line.
    pub fn build(rows: &[Stored<ProductionRecord>], seeds: &[String]) -> Self {
        let mut categories: Vec<&str> = Vec::new();
        let observed = rows.iter().map(|r| r.record.egg_type.as_str());
        for category in seeds.iter().map(String::as_str).chain(observed) {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }

        let mut dates: Vec<String> = Vec::new();
        let mut date_index: HashMap<&str, usize> = HashMap::new();
        let mut series: Vec<CategorySeries> = categories
            .iter()
            .map(|c| CategorySeries {
                category: c.to_string(),
                quantities: Vec::with_capacity(rows.len()),
            })
            .collect();

        for row in rows {
            let record = &row.record;
            let ix = match date_index.get(record.date.as_str()) {
                Some(ix) => *ix,
                None => {
                    let ix = dates.len();
                    dates.push(record.date.clone());
                    date_index.insert(record.date.as_str(), ix);
                    for s in series.iter_mut() {
                        s.quantities.push(0);
                    }
                    ix
                }
            };
            if let Some(s) = series.iter_mut().find(|s| s.category == record.egg_type) {
                s.quantities[ix] += record.quantity;
            }
        }

        Self { dates, series }
    }

    pub fn to_chart(&self) -> Chart {
        let mut chart = base_chart("Production Over Time", "Production", &self.dates);
        for s in &self.series {
            let mut line = Line::new()
                .name(format!("Production Type {}", s.category))
                .data(s.quantities.iter().map(|q| *q as f64).collect());
            if let Some((_, color)) = CATEGORY_COLORS.iter().find(|(c, _)| *c == s.category) {
                line = line.item_style(ItemStyle::new().color(*color));
            }
            chart = chart.series(line);
        }
        chart
    }
}

/// Quantity sold per date.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SalesChart {
    pub dates: Vec<String>,
    pub quantities: Vec<i64>,
}

impl SalesChart {
    pub fn build(rows: &[Stored<SalesRecord>]) -> Self {
        let (dates, quantities) = rows
            .iter()
            .map(|r| (r.record.date.clone(), r.record.quantity))
            .unzip();
        Self { dates, quantities }
    }

    pub fn to_chart(&self) -> Chart {
        base_chart("Sales Over Time", "Sales", &self.dates).series(
            Line::new()
                .name("Sales")
                .item_style(ItemStyle::new().color(SALES_COLOR))
                .data(self.quantities.iter().map(|q| *q as f64).collect()),
        )
    }
}

/// Revenue per production date.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RevenueChart {
    pub dates: Vec<String>,
    pub revenue: Vec<Decimal>,
}

impl RevenueChart {
    pub fn build(rows: &[RevenueRow]) -> Self {
        let (dates, revenue) = rows.iter().map(|r| (r.date.clone(), r.revenue)).unzip();
        Self { dates, revenue }
    }

    pub fn to_chart(&self) -> Chart {
        base_chart("Revenue Over Time", "Revenue", &self.dates).series(
            Line::new()
                .name("Revenue")
                .item_style(ItemStyle::new().color(REVENUE_COLOR))
                .data(
                    self.revenue
                        .iter()
                        .map(|r| r.to_f64().unwrap_or_default())
                        .collect(),
                ),
        )
    }
}

/// The data behind any one of the three charts.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Production(ProductionChart),
    Sales(SalesChart),
    Revenue(RevenueChart),
}

impl Report {
    /// Queries the tables `kind` needs and builds its report.
    pub(crate) async fn load(db: &Db, kind: ChartKind, categories: &[String]) -> Res<Self> {
        Ok(match kind {
            ChartKind::Production => {
                Report::Production(ProductionChart::build(&db.production_rows().await?, categories))
            }
            ChartKind::Sales => Report::Sales(SalesChart::build(&db.sales_rows().await?)),
            ChartKind::Revenue => Report::Revenue(RevenueChart::build(&db.revenue_rows().await?)),
        })
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            Report::Production(_) => ChartKind::Production,
            Report::Sales(_) => ChartKind::Sales,
            Report::Revenue(_) => ChartKind::Revenue,
        }
    }

    pub fn dates(&self) -> &[String] {
        match self {
            Report::Production(c) => &c.dates,
            Report::Sales(c) => &c.dates,
            Report::Revenue(c) => &c.dates,
        }
    }

    pub fn to_chart(&self) -> Chart {
        match self {
            Report::Production(c) => c.to_chart(),
            Report::Sales(c) => c.to_chart(),
            Report::Revenue(c) => c.to_chart(),
        }
    }

    /// Renders the chart as a string in the requested format.
    pub fn render(&self, format: ChartFormat, width: u64, height: u64) -> Res<String> {
        let chart = self.to_chart();
        match format {
            ChartFormat::Html => HtmlRenderer::new(format!("{} chart", self.kind()), width, height)
                .render(&chart)
                .map_err(|e| anyhow!("Unable to render the {} chart: {e:?}", self.kind())),
            ChartFormat::Json => serde_json::to_string_pretty(&chart)
                .with_context(|| format!("Unable to serialize the {} chart", self.kind())),
        }
    }
}

fn base_chart(title: &str, y_name: &str, dates: &[String]) -> Chart {
    Chart::new()
        .title(Title::new().text(title))
        .tooltip(Tooltip::new().trigger(Trigger::Axis))
        .legend(Legend::new().top("bottom"))
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .name("Date")
                .data(dates.to_vec()),
        )
        .y_axis(Axis::new().type_(AxisType::Value).name(y_name))
}

/// Rebuilds the `kind` chart and writes it to `out`, or to the charts directory when `out` is
/// `None`. Returns the report and the path written.
pub(crate) async fn write_chart(
    config: &Config,
    kind: ChartKind,
    format: ChartFormat,
    out: Option<&Path>,
) -> Res<(Report, PathBuf)> {
    let report = Report::load(config.db(), kind, config.categories()).await?;
    let rendered = report.render(format, config.chart_width(), config.chart_height())?;
    let path = match out {
        Some(p) => p.to_path_buf(),
        None => config.charts().join(kind.file_name(format)),
    };
    utils::make_parent_dir(&path).await?;
    utils::write(&path, rendered).await?;
    debug!("Wrote {kind} chart to {}", path.display());
    Ok((report, path))
}

/// Redraws the `kind` chart into the charts directory after a table changed.
pub(crate) async fn refresh(config: &Config, kind: ChartKind) -> Res<PathBuf> {
    let (_, path) = write_chart(config, kind, ChartFormat::Html, None).await?;
    Ok(path)
}
