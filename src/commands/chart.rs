//! The `chart` command: draw one or all of the production, sales and revenue charts.

use crate::args::{ChartArgs, ChartSelection};
use crate::commands::Out;
use crate::error::{Error, ErrorType, IntoResult};
use crate::report::{self, ChartKind};
use crate::{Config, Result};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A chart that was written, and how many dates it covers.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChartFile {
    pub kind: ChartKind,
    pub path: PathBuf,
    pub dates: usize,
}

/// Rebuilds the selected charts from the current table contents and writes them out.
///
/// # Errors
///
/// - A validation error if `--out` is given together with `all`.
/// - A chart error if a chart cannot be rendered or written.
pub async fn chart(config: Config, args: ChartArgs) -> Result<Out<Vec<ChartFile>>> {
    if args.selection() == ChartSelection::All && args.out().is_some() {
        return Err(Error::new(
            ErrorType::Validation,
            anyhow!("--out names a single file and cannot be used with 'all'"),
        ));
    }

    let mut files = Vec::new();
    for kind in args.selection().kinds() {
        let (report, path) = report::write_chart(&config, kind, args.format(), args.out())
            .await
            .pub_result(ErrorType::Chart)?;
        files.push(ChartFile {
            kind,
            path,
            dates: report.dates().len(),
        });
    }

    let message = match files.as_slice() {
        [one] => format!("Wrote the {} chart to {}", one.kind, one.path.display()),
        many => format!(
            "Wrote {} charts to {}",
            many.len(),
            config.charts().display()
        ),
    };
    Ok(Out::new(message, files))
}
