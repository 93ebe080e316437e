use crate::analysis::{AMOUNT_FIELD, DATE_FIELD, TRANSACTION_ID_FIELD};
use crate::core::schema::parse_date_value;
use crate::domain::model::{Record, Table};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Total Sales")]
    pub total_sales: f64,
    #[serde(rename = "Total Transactions")]
    pub total_transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSales {
    #[serde(rename = "Start Date")]
    pub start_date: NaiveDate,
    #[serde(rename = "End Date")]
    pub end_date: NaiveDate,
    #[serde(rename = "Total Sales")]
    pub total_sales: f64,
    #[serde(rename = "Total Transactions")]
    pub total_transactions: usize,
}

fn entry_day(record: &Record) -> Option<NaiveDate> {
    record
        .get(DATE_FIELD)
        .and_then(parse_date_value)
        .map(|dt| dt.date())
}

/// Sum of amounts and count of identified transactions. Non-numeric amounts count as 0.
pub(crate) fn totals<'a>(records: impl Iterator<Item = &'a Record>) -> (f64, usize) {
    records.fold((0.0, 0), |(sum, count), record| {
        let amount = record.get_f64(AMOUNT_FIELD).unwrap_or(0.0);
        let counted = record
            .get(TRANSACTION_ID_FIELD)
            .is_some_and(|v| !v.is_null());
        (sum + amount, count + usize::from(counted))
    })
}

/// Sales on a single day. Rows without a usable date are ignored.
pub fn daily_sales_report(transactions: &Table, date: NaiveDate) -> DailySales {
    let (total_sales, total_transactions) =
        totals(transactions.iter().filter(|r| entry_day(r) == Some(date)));

    if total_transactions == 0 && total_sales == 0.0 {
        tracing::info!("No transactions on {}", date);
    } else {
        tracing::info!(
            "Sales for {}: total={}, transactions={}",
            date,
            total_sales,
            total_transactions
        );
    }

    DailySales {
        date,
        total_sales,
        total_transactions,
    }
}

/// Sales between `start` and `end`, both inclusive.
pub fn sales_report_range(transactions: &Table, start: NaiveDate, end: NaiveDate) -> RangeSales {
    let (total_sales, total_transactions) = totals(
        transactions
            .iter()
            .filter(|r| entry_day(r).is_some_and(|d| d >= start && d <= end)),
    );

    tracing::info!(
        "Sales for {} - {}: total={}, transactions={}",
        start,
        end,
        total_sales,
        total_transactions
    );

    RangeSales {
        start_date: start,
        end_date: end,
        total_sales,
        total_transactions,
    }
}
