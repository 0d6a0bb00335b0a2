//! These structs provide the CLI interface for the poultry CLI.

use crate::commands::ListFormat;
use crate::report::{ChartFormat, ChartKind};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// poultry: keep track of egg production, egg prices and egg sales.
///
/// Records are kept in a local SQLite database, one record per date in each of the production,
/// price and sales tables. Entering a record for a date that already has one replaces it. There is
/// no way to delete or partially edit a record. A replaced record keeps its original position in
/// charts, listings and the export.
///
/// After each entry the matching chart is redrawn into $POULTRY_HOME/charts: production entries
/// redraw the production chart, price entries the revenue chart and sales entries the sales chart.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Record the eggs produced on a date. Replaces any production record for that date.
    ///
    /// A replaced record keeps its place on the production chart and in listings; only its type
    /// and quantity change.
    Production(ProductionArgs),
    /// Set the egg price for a date. Replaces any price already set for that date.
    ///
    /// A replaced price keeps its place in listings and the export.
    Price(PriceArgs),
    /// Record the eggs sold on a date. Replaces any sales record for that date.
    ///
    /// A replaced record keeps its place on the sales chart and in listings; only its quantity
    /// changes.
    Sales(SalesArgs),
    /// Draw the production, sales or revenue chart.
    ///
    /// Revenue is production multiplied by the price of the same date, or zero when that date has
    /// no price. Sales quantities do not enter the revenue figure.
    Chart(ChartArgs),
    /// Print the rows of a table, or the revenue rows.
    List(ListArgs),
    /// Write all three tables to an .xlsx workbook, one sheet per table.
    Export(ExportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the database, config and charts are kept. Defaults to ~/poultry
    #[arg(long, env = "POULTRY_HOME", default_value_t = default_poultry_home())]
    poultry_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, poultry_home: PathBuf) -> Self {
        Self {
            log_level,
            poultry_home: poultry_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn poultry_home(&self) -> &DisplayPath {
        &self.poultry_home
    }
}

/// The date field shared by the entry subcommands.
#[derive(Debug, Parser, Clone, Default)]
pub struct DateArgs {
    /// The date of the entry. Free text; it is the key a later entry for the same date replaces.
    #[arg(long)]
    date: Option<String>,

    /// Use today's date, formatted YYYY-MM-DD, instead of --date.
    #[arg(long, conflicts_with = "date")]
    today: bool,
}

impl DateArgs {
    pub fn new(date: Option<String>, today: bool) -> Self {
        Self { date, today }
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn today(&self) -> bool {
        self.today
    }
}

/// Args for the `poultry production` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ProductionArgs {
    #[clap(flatten)]
    date: DateArgs,

    /// The egg category code, e.g. A, B or C.
    #[arg(long = "type", default_value = "")]
    egg_type: String,

    /// The number of eggs produced.
    #[arg(long, default_value = "")]
    quantity: String,
}

impl ProductionArgs {
    pub fn new(date: DateArgs, egg_type: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            date,
            egg_type: egg_type.into(),
            quantity: quantity.into(),
        }
    }

    pub fn date(&self) -> &DateArgs {
        &self.date
    }

    pub fn egg_type(&self) -> &str {
        &self.egg_type
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }
}

/// Args for the `poultry price` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct PriceArgs {
    #[clap(flatten)]
    date: DateArgs,

    /// The price of one egg on that date.
    #[arg(long, default_value = "")]
    value: String,
}

impl PriceArgs {
    pub fn new(date: DateArgs, value: impl Into<String>) -> Self {
        Self {
            date,
            value: value.into(),
        }
    }

    pub fn date(&self) -> &DateArgs {
        &self.date
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Args for the `poultry sales` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct SalesArgs {
    #[clap(flatten)]
    date: DateArgs,

    /// The number of eggs sold.
    #[arg(long, default_value = "")]
    quantity: String,
}

impl SalesArgs {
    pub fn new(date: DateArgs, quantity: impl Into<String>) -> Self {
        Self {
            date,
            quantity: quantity.into(),
        }
    }

    pub fn date(&self) -> &DateArgs {
        &self.date
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }
}

/// Which charts the `poultry chart` command draws.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChartSelection {
    Production,
    Sales,
    Revenue,
    All,
}

serde_plain::derive_display_from_serialize!(ChartSelection);
serde_plain::derive_fromstr_from_deserialize!(ChartSelection);

impl ChartSelection {
    pub fn kinds(&self) -> Vec<ChartKind> {
        match self {
            ChartSelection::Production => vec![ChartKind::Production],
            ChartSelection::Sales => vec![ChartKind::Sales],
            ChartSelection::Revenue => vec![ChartKind::Revenue],
            ChartSelection::All => ChartKind::ALL.to_vec(),
        }
    }
}

/// Args for the `poultry chart` command.
#[derive(Debug, Parser, Clone)]
pub struct ChartArgs {
    /// The chart to draw.
    #[arg(value_enum)]
    selection: ChartSelection,

    /// Where to write the chart. Defaults to $POULTRY_HOME/charts/<chart>.<format>. Not allowed
    /// together with `all`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write a standalone HTML page or just the ECharts option JSON.
    #[arg(long, value_enum, default_value_t = ChartFormat::Html)]
    format: ChartFormat,
}

impl ChartArgs {
    pub fn new(selection: ChartSelection, out: Option<PathBuf>, format: ChartFormat) -> Self {
        Self {
            selection,
            out,
            format,
        }
    }

    pub fn selection(&self) -> ChartSelection {
        self.selection
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }

    pub fn format(&self) -> ChartFormat {
        self.format
    }
}

/// What the `poultry list` command prints.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ListTarget {
    Production,
    Prices,
    Sales,
    Revenue,
}

serde_plain::derive_display_from_serialize!(ListTarget);
serde_plain::derive_fromstr_from_deserialize!(ListTarget);

/// Args for the `poultry list` command.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    /// The rows to print.
    #[arg(value_enum)]
    target: ListTarget,

    /// Output format.
    #[arg(long, value_enum, default_value_t = ListFormat::Table)]
    format: ListFormat,
}

impl ListArgs {
    pub fn new(target: ListTarget, format: ListFormat) -> Self {
        Self { target, format }
    }

    pub fn target(&self) -> ListTarget {
        self.target
    }

    pub fn format(&self) -> ListFormat {
        self.format
    }
}

/// Args for the `poultry export` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ExportArgs {
    /// Where to save the workbook. When no path is given nothing is exported.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(out: Option<PathBuf>) -> Self {
        Self { out }
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

fn default_poultry_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("poultry"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --poultry-home or POULTRY_HOME instead of relying on the \
                default directory. If you continue using the program right now, your data will \
                be kept in ./poultry",
            );
            PathBuf::from("poultry")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
