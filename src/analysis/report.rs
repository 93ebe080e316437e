use crate::analysis::product::{sales_summary, ProductSales};
use crate::analysis::sales::{DailySales, RangeSales};
use crate::domain::model::Table;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const TRANSACTIONS_SHEET: &str = "transactions.csv";
pub const PRODUCTS_SHEET: &str = "products.csv";
pub const SUMMARY_SHEET: &str = "sales_summary.csv";
pub const CHART_SHEET: &str = "sales_chart.csv";

#[derive(Debug, Serialize)]
struct ChartPoint<'a> {
    #[serde(rename = "Product")]
    product: &'a str,
    #[serde(rename = "Total Sales")]
    total_sales: f64,
}

/// Renders a table with one column per field name. Null and missing cells are empty.
pub fn table_to_csv(table: &Table) -> Result<Vec<u8>> {
    let columns = table.columns();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;

    for record in table.iter() {
        let row = columns.iter().map(|column| match record.get(column) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        writer.write_record(row)?;
    }

    finish(writer)
}

pub fn rows_to_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| crate::utils::error::ReportError::Io(e.into_error()))
}

/// Writes the full sales workbook (raw sheets, per-product summary and chart series)
/// as a ZIP archive named `file_name`. Returns the name written.
pub async fn generate_sales_report<S: Storage>(
    storage: &S,
    file_name: &str,
    transactions: &Table,
    products: &Table,
) -> Result<String> {
    let summary = sales_summary(transactions, products);
    let chart: Vec<ChartPoint<'_>> = summary
        .iter()
        .map(|row| ChartPoint {
            product: &row.name,
            total_sales: row.total_sales,
        })
        .collect();

    let sheets = [
        (TRANSACTIONS_SHEET, table_to_csv(transactions)?),
        (PRODUCTS_SHEET, table_to_csv(products)?),
        (SUMMARY_SHEET, rows_to_csv(&summary)?),
        (CHART_SHEET, rows_to_csv(&chart)?),
    ];

    tracing::debug!("Creating ZIP workbook with {} sheets", sheets.len());

    let zip_data = {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in &sheets {
            zip.start_file::<_, ()>(*name, FileOptions::default())?;
            zip.write_all(data)?;
        }
        zip.finish()?.into_inner()
    };

    storage.write_file(file_name, &zip_data).await?;
    tracing::info!(
        "📁 Sales report written: {} ({} products summarized)",
        file_name,
        summary.len()
    );
    Ok(file_name.to_string())
}

pub async fn write_daily_report<S: Storage>(storage: &S, file_name: &str, report: &DailySales) -> Result<String> {
    write_single(storage, file_name, report).await
}

pub async fn write_range_report<S: Storage>(storage: &S, file_name: &str, report: &RangeSales) -> Result<String> {
    write_single(storage, file_name, report).await
}

pub async fn write_product_report<S: Storage>(
    storage: &S,
    file_name: &str,
    report: &ProductSales,
) -> Result<String> {
    write_single(storage, file_name, report).await
}

async fn write_single<S: Storage, T: Serialize>(storage: &S, file_name: &str, row: &T) -> Result<String> {
    let data = rows_to_csv(std::slice::from_ref(row))?;
    storage.write_file(file_name, &data).await?;
    tracing::info!("📁 Report written: {}", file_name);
    Ok(file_name.to_string())
}
