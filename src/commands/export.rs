//! The `export` command: write every table to an `.xlsx` workbook.

use crate::args::ExportArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::export::{self, SheetSummary};
use crate::{utils, Config, Result};
use tracing::info;

/// Writes the production, price and sales tables to the workbook at `args.out()`.
///
/// When no destination is given nothing is read or written and the command succeeds.
pub async fn export(config: Config, args: ExportArgs) -> Result<Out<Vec<SheetSummary>>> {
    let Some(path) = args.out() else {
        info!("No export destination chosen");
        return Ok(Out::new_message(
            "No export destination chosen; nothing was exported",
        ));
    };

    let sheets = export::read_sheets(config.db())
        .await
        .pub_result(ErrorType::Database)?;
    utils::make_parent_dir(path)
        .await
        .pub_result(ErrorType::Export)?;
    let summaries = export::write_workbook(path, &sheets).pub_result(ErrorType::Export)?;

    Ok(Out::new(
        format!("Data exported successfully to {}", path.display()),
        summaries,
    ))
}
