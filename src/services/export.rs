//! Spreadsheet rendering of finalized documents.
//!
//! [`SheetProjection`] is the pure layout (title block, header row, one row
//! per item); [`render_xlsx`] turns it into workbook bytes.

use crate::{
    errors::ServiceError,
    services::documents::{BillDocument, ReceptionDocument},
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};

const COLUMN_WIDTH: f64 = 15.0;
const MISSING: &str = "-";

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    Number(Decimal),
}

/// Layout of one exported document.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetProjection {
    pub sheet_name: &'static str,
    pub title: &'static str,
    /// Lines under the title, e.g. `Employee: Ana Pop`
    pub details: Vec<String>,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetProjection {
    /// 0-based row of the header line: title, blank row, details, blank row.
    pub fn header_row(&self) -> u32 {
        2 + self.details.len() as u32 + 1
    }

    pub fn width(&self) -> u16 {
        self.headers.len() as u16
    }
}

/// A rendered export ready for download.
#[derive(Clone, Debug)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

fn text(value: impl Into<String>) -> Cell {
    Cell::Text(value.into())
}

fn or_missing(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(MISSING)
        .to_string()
}

fn stamp(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M").to_string()
}

pub fn project_bill(document: &BillDocument) -> SheetProjection {
    let bill = &document.bill;
    let mut items: Vec<_> = document.items.iter().collect();
    items.sort_by_key(|item| item.item_number);

    SheetProjection {
        sheet_name: "Consumption Bill",
        title: "CONSUMPTION BILL",
        details: vec![
            format!("Date: {}", stamp(&bill.bill_date)),
            format!("Employee: {}", bill.employee_name),
            format!(
                "Signature: {}",
                or_missing(bill.employee_signature.as_deref())
            ),
        ],
        headers: vec!["No.", "Product Code", "Name", "Unit", "Quantity", "Location"],
        rows: items
            .into_iter()
            .map(|item| {
                vec![
                    Cell::Number(Decimal::from(item.item_number)),
                    text(&item.product_code),
                    text(&item.product_name),
                    text(&item.unit),
                    Cell::Number(item.quantity),
                    text(or_missing(item.location.as_deref())),
                ]
            })
            .collect(),
    }
}

pub fn project_reception(document: &ReceptionDocument) -> SheetProjection {
    let reception = &document.reception;
    let mut items: Vec<_> = document.items.iter().collect();
    items.sort_by_key(|item| item.item_number);

    SheetProjection {
        sheet_name: "Reception Sheet",
        title: "RECEPTION SHEET",
        details: vec![
            format!("Date: {}", stamp(&reception.reception_date)),
            format!("Supplier: {}", reception.supplier),
            format!(
                "Document No.: {}",
                or_missing(reception.document_number.as_deref())
            ),
            format!("Notes: {}", or_missing(reception.notes.as_deref())),
        ],
        headers: vec![
            "No.",
            "Product Code",
            "Name",
            "Unit",
            "Quantity",
            "Location",
            "Entry Date",
        ],
        rows: items
            .into_iter()
            .map(|item| {
                vec![
                    Cell::Number(Decimal::from(item.item_number)),
                    text(&item.product_code),
                    text(&item.product_name),
                    text(&item.unit),
                    Cell::Number(item.quantity),
                    text(or_missing(item.location.as_deref())),
                    text(item.entry_date.format("%Y-%m-%d").to_string()),
                ]
            })
            .collect(),
    }
}

pub fn bill_file_name(document: &BillDocument) -> String {
    format!(
        "consumption_bill_{}_{}.xlsx",
        document.bill.id,
        document.bill.bill_date.format("%Y%m%d")
    )
}

pub fn reception_file_name(document: &ReceptionDocument) -> String {
    format!(
        "reception_{}_{}.xlsx",
        document.reception.id,
        document.reception.reception_date.format("%Y%m%d")
    )
}

fn xlsx_error(err: rust_xlsxwriter::XlsxError) -> ServiceError {
    ServiceError::ExportError(err.to_string())
}

/// Renders `sheet` as a single-worksheet xlsx workbook.
pub fn render_xlsx(sheet: &SheetProjection) -> Result<Vec<u8>, ServiceError> {
    let title_format = Format::new()
        .set_bold()
        .set_font_size(16)
        .set_align(FormatAlign::Center);
    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);
    let cell_format = Format::new().set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet.sheet_name).map_err(xlsx_error)?;

    let last_col = sheet.width().saturating_sub(1);
    worksheet
        .merge_range(0, 0, 0, last_col, sheet.title, &title_format)
        .map_err(xlsx_error)?;

    for (offset, line) in sheet.details.iter().enumerate() {
        worksheet
            .write_string(2 + offset as u32, 0, line)
            .map_err(xlsx_error)?;
    }

    let header_row = sheet.header_row();
    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(header_row, col as u16, *header, &header_format)
            .map_err(xlsx_error)?;
    }

    for (offset, row) in sheet.rows.iter().enumerate() {
        let row_num = header_row + 1 + offset as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            let written = match cell {
                Cell::Text(value) => {
                    worksheet.write_string_with_format(row_num, col, value, &cell_format)
                }
                Cell::Number(value) => match value.to_f64() {
                    Some(number) => {
                        worksheet.write_number_with_format(row_num, col, number, &cell_format)
                    }
                    None => worksheet.write_string_with_format(
                        row_num,
                        col,
                        value.to_string(),
                        &cell_format,
                    ),
                },
            };
            written.map_err(xlsx_error)?;
        }
    }

    for col in 0..sheet.width() {
        worksheet
            .set_column_width(col, COLUMN_WIDTH)
            .map_err(xlsx_error)?;
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}
