//! Month payroll workbook.
//!
//! Derived columns are written as live formulas over the row's own cells
//! so the arithmetic can be audited in the sheet. A value that does not
//! match its formula (an admin override) is written as a plain number.
//! Employees whose payroll could not be computed are listed with the
//! reason on a second sheet.

use rust_xlsxwriter::{Color, Format, FormatBorder, Formula, Workbook, XlsxError};

use crate::{
    model::employee::EmployeeSummary,
    payroll::{
        PayrollBreakdown, PayrollMonth,
        calculator::{DA_RATE, ESIC_CONTRIBUTION_RATE, ESIC_RATE, HRA_RATE},
        service::PayrollSheetRow,
    },
};

const HEADERS: [&str; 22] = [
    "Employee Code",
    "Name",
    "Designation",
    "Month",
    "Working Days",
    "Reported Days",
    "Basic",
    "Pay Scale",
    "Special Pay",
    "DA",
    "HRA",
    "Gross Earning",
    "Provident Fund",
    "Professional Tax",
    "Advance",
    "TDS",
    "ESIC",
    "Total Deductions",
    "Net Pay",
    "CPF",
    "ESIC Contribution",
    "Medical Contribution",
];

pub const SKIPPED_SHEET: &str = "Skipped";

const SKIPPED_HEADERS: [&str; 4] = ["Employee Code", "Name", "Designation", "Reason"];

/// First column holding an amount ("Basic"); totals cover it and everything after.
const FIRST_AMOUNT_COL: u16 = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Formula { expr: String, cached: f64 },
}

fn formula(expr: String, cached: f64) -> Cell {
    Cell::Formula { expr, cached }
}

/// A formula when `value` is what the formula evaluates to, else the number.
fn formula_or_number(expr: String, expected: f64, value: f64) -> Cell {
    if value == expected {
        formula(expr, value)
    } else {
        Cell::Number(value)
    }
}

/// Cells of one payroll line. `r` is the 1-based spreadsheet row.
pub fn row_cells(employee: &EmployeeSummary, breakdown: &PayrollBreakdown, r: u32) -> Vec<Cell> {
    let f = &breakdown.figures;

    vec![
        Cell::Text(employee.employee_code.clone()),
        Cell::Text(employee.name.clone()),
        Cell::Text(employee.designation.clone()),
        Cell::Text(breakdown.month.to_string()),
        Cell::Number(f.working_days),
        Cell::Number(f.reported_days),
        Cell::Number(f.basic),
        formula(format!("=IF(F{r}=0,G{r},ROUND(F{r}/E{r}*G{r},0))"), f.pay_scale),
        Cell::Number(f.special_pay),
        formula_or_number(
            format!("=ROUND(H{r}*{DA_RATE},0)"),
            f.derived_da(),
            f.da,
        ),
        formula_or_number(
            format!("=ROUND(H{r}*{HRA_RATE},0)"),
            f.derived_hra(),
            f.hra,
        ),
        formula(format!("=H{r}+I{r}+J{r}+K{r}"), f.gross_earning),
        Cell::Number(f.provident_fund),
        Cell::Number(f.professional),
        Cell::Number(f.advance),
        Cell::Number(f.tds),
        formula_or_number(
            format!("=ROUND(L{r}*{ESIC_RATE},0)"),
            f.derived_esic(),
            f.esic,
        ),
        formula(format!("=M{r}+N{r}+O{r}+P{r}+Q{r}"), f.total_deductions),
        formula(format!("=L{r}-R{r}"), f.net_pay),
        formula(format!("=M{r}"), f.cpf),
        formula_or_number(
            format!("=ROUND(L{r}*{ESIC_CONTRIBUTION_RATE},0)"),
            f.derived_esic_contribution(),
            f.esic_contribution,
        ),
        Cell::Number(f.medical_contribution),
    ]
}

/// An employee left out of the workbook's payroll sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub employee: EmployeeSummary,
    pub reason: String,
}

/// Splits a month sheet into exportable lines and skipped employees.
pub fn split_sheet(
    rows: Vec<PayrollSheetRow>,
) -> (Vec<(EmployeeSummary, PayrollBreakdown)>, Vec<SkippedRow>) {
    let mut lines = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();

    for row in rows {
        match (row.breakdown, row.error) {
            (Some(breakdown), _) => lines.push((row.employee, breakdown)),
            (None, error) => skipped.push(SkippedRow {
                employee: row.employee,
                reason: error.unwrap_or_else(|| "payroll not computed".to_string()),
            }),
        }
    }

    (lines, skipped)
}

fn column_letter(col: u16) -> char {
    char::from(b'A' + col as u8)
}

/// Builds the workbook for a month and returns the xlsx bytes.
pub fn export_month(
    rows: &[(EmployeeSummary, PayrollBreakdown)],
    skipped: &[SkippedRow],
    month: PayrollMonth,
) -> Result<Vec<u8>, XlsxError> {
    build_workbook(rows, skipped, month)?.save_to_buffer()
}

fn build_workbook(
    rows: &[(EmployeeSummary, PayrollBreakdown)],
    skipped: &[SkippedRow],
    month: PayrollMonth,
) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name(format!("Payroll {month}"))?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin);
    let amount_format = Format::new().set_num_format("#,##0");
    let total_format = Format::new().set_bold().set_num_format("#,##0");

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    worksheet.set_column_width(0, 15)?;
    worksheet.set_column_width(1, 28)?;
    worksheet.set_column_width(2, 20)?;
    for col in 3..HEADERS.len() as u16 {
        worksheet.set_column_width(col, 14)?;
    }

    for (idx, (employee, breakdown)) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;

        for (col, cell) in row_cells(employee, breakdown, row + 1).into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(row, col, text)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number_with_format(row, col, value, &amount_format)?;
                }
                Cell::Formula { expr, cached } => {
                    let formula = Formula::new(expr).set_result(cached.to_string());
                    worksheet.write_formula_with_format(row, col, formula, &amount_format)?;
                }
            }
        }
    }

    if !rows.is_empty() {
        let last_row = rows.len() as u32;
        let total_row = last_row + 1;

        worksheet.write_string_with_format(total_row, 0, "Total", &total_format)?;

        for col in FIRST_AMOUNT_COL..HEADERS.len() as u16 {
            let letter = column_letter(col);
            let sum: f64 = rows
                .iter()
                .map(|(employee, breakdown)| amount_at(employee, breakdown, col))
                .sum();
            let formula = Formula::new(format!("=SUM({letter}2:{letter}{})", last_row + 1))
                .set_result(sum.to_string());
            worksheet.write_formula_with_format(total_row, col, formula, &total_format)?;
        }

        worksheet.autofilter(0, 0, last_row, HEADERS.len() as u16 - 1)?;
    }

    worksheet.set_freeze_panes(1, 0)?;

    if !skipped.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SKIPPED_SHEET)?;

        for (col, header) in SKIPPED_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        sheet.set_column_width(0, 15)?;
        sheet.set_column_width(1, 28)?;
        sheet.set_column_width(2, 20)?;
        sheet.set_column_width(3, 50)?;

        for (idx, row) in skipped.iter().enumerate() {
            let r = (idx + 1) as u32;
            sheet.write_string(r, 0, &row.employee.employee_code)?;
            sheet.write_string(r, 1, &row.employee.name)?;
            sheet.write_string(r, 2, &row.employee.designation)?;
            sheet.write_string(r, 3, &row.reason)?;
        }
    }

    Ok(workbook)
}

fn amount_at(employee: &EmployeeSummary, breakdown: &PayrollBreakdown, col: u16) -> f64 {
    match row_cells(employee, breakdown, 2).into_iter().nth(col as usize) {
        Some(Cell::Number(value)) | Some(Cell::Formula { cached: value, .. }) => value,
        _ => 0.0,
    }
}

/// Download name for a month's workbook.
pub fn file_name(month: PayrollMonth) -> String {
    format!("payroll_{month}.xlsx")
}
