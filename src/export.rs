//! Spreadsheet export of a filtered item set

use crate::error::{Error, Result};
use crate::types::ItemDetail;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// MIME type of the generated workbook
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "Pokemon";
const HEADERS: [&str; 3] = ["ID", "Name", "Types"];

/// Rendered workbook plus the file name it should be delivered under
#[derive(Clone, Debug)]
pub struct SpreadsheetExport {
    /// Suggested attachment file name
    pub file_name: String,
    /// xlsx bytes
    pub bytes: Vec<u8>,
    /// Number of data rows written
    pub rows: usize,
}

impl SpreadsheetExport {
    /// Render `items` as a single-sheet workbook, one row per item in input order
    ///
    /// Columns: numeric id, name, comma-joined category names.
    pub fn render(items: &[ItemDetail]) -> Result<Self> {
        let bytes = write_workbook(items).map_err(|e| Error::Export(e.to_string()))?;
        let file_name = format!(
            "pokemon_export_{}.xlsx",
            chrono::Utc::now().format("%Y%m%d%H%M%S")
        );
        tracing::debug!(rows = items.len(), bytes = bytes.len(), "workbook rendered");
        Ok(Self {
            file_name,
            bytes,
            rows: items.len(),
        })
    }
}

fn write_workbook(items: &[ItemDetail]) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (idx, item) in items.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_number(row, 0, f64::from(item.id))?;
        sheet.write_string(row, 1, item.name.as_str())?;
        sheet.write_string(row, 2, item.category_names())?;
    }

    sheet.set_column_width(1, 24)?;
    sheet.set_column_width(2, 32)?;

    workbook.save_to_buffer()
}
