//! Writes transactions as CSV for download.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use time::{UtcOffset, macros::format_description};

use crate::Error;

use super::core::Transaction;

const HEADER: [&str; 5] = ["Title", "Amount", "Type", "Category", "Date"];

/// Write transactions as CSV with the header `Title,Amount,Type,Category,Date`.
///
/// The filtered transactions are exported when there are any, otherwise all
/// transactions are. Returns `None` when both are empty.
///
/// Dates are written as `dd/mm/yyyy hh:mm:ss` in `local_offset`, or left empty
/// for transactions without a creation time.
///
/// # Errors
/// Returns [Error::ExportError] if the CSV could not be written.
pub fn export_csv(
    filtered: &[Transaction],
    all: &[Transaction],
    local_offset: UtcOffset,
) -> Result<Option<String>, Error> {
    let transactions = if filtered.is_empty() { all } else { filtered };

    if transactions.is_empty() {
        return Ok(None);
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADER).map_err(to_export_error)?;

    for transaction in transactions {
        let amount = transaction.amount.to_string();
        let date = format_date(transaction, local_offset)?;

        writer
            .write_record([
                transaction.title.as_str(),
                amount.as_str(),
                transaction.kind.as_str(),
                transaction.category.as_str(),
                date.as_str(),
            ])
            .map_err(to_export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::ExportError(error.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|error| Error::ExportError(error.to_string()))?;

    Ok(Some(text.trim_end_matches('\n').to_owned()))
}

fn format_date(transaction: &Transaction, local_offset: UtcOffset) -> Result<String, Error> {
    match transaction.created_at {
        Some(created_at) => created_at
            .to_offset(local_offset)
            .format(format_description!(
                "[day]/[month]/[year] [hour]:[minute]:[second]"
            ))
            .map_err(|error| Error::ExportError(error.to_string())),
        None => Ok(String::new()),
    }
}

fn to_export_error(error: csv::Error) -> Error {
    tracing::error!("Could not write CSV record: {error}");
    Error::ExportError(error.to_string())
}
