use crate::analysis::sales::totals;
use crate::analysis::{id_key, round2, AMOUNT_FIELD, PRODUCT_ID_FIELD};
use crate::domain::model::Table;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Total Sales")]
    pub total_sales: f64,
    #[serde(rename = "Total Transactions")]
    pub total_transactions: usize,
    #[serde(rename = "Average Sale")]
    pub average_sale: f64,
}

/// One row of the per-product summary sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub name: String,
    #[serde(rename = "Total_Sales")]
    pub total_sales: f64,
    #[serde(rename = "Total_Transactions")]
    pub total_transactions: usize,
}

/// Sales statistics for the product called `product_name` (case-insensitive).
/// `None` when no such product exists.
pub fn analyze_product(
    transactions: &Table,
    products: &Table,
    product_name: &str,
) -> Option<ProductSales> {
    let wanted = product_name.to_lowercase();
    let product = products.iter().find(|p| {
        p.get_str("name")
            .is_some_and(|name| name.to_lowercase() == wanted)
    });

    let Some(product) = product else {
        tracing::warn!("Product '{}' not found", product_name);
        return None;
    };
    let product_id = product.get("id").and_then(id_key)?;

    let matching: Vec<_> = transactions
        .iter()
        .filter(|t| t.get(PRODUCT_ID_FIELD).and_then(id_key).as_deref() == Some(product_id.as_str()))
        .collect();

    if matching.is_empty() {
        tracing::info!("No transactions for product '{}'", product_name);
        return Some(ProductSales {
            product_name: product_name.to_string(),
            total_sales: 0.0,
            total_transactions: 0,
            average_sale: 0.0,
        });
    }

    let (total_sales, total_transactions) = totals(matching.iter().copied());
    // Rows without a numeric amount do not count towards the average.
    let priced = matching
        .iter()
        .filter(|t| t.get_f64(AMOUNT_FIELD).is_some_and(|a| !a.is_nan()))
        .count();
    let average_sale = if priced == 0 {
        0.0
    } else {
        round2(total_sales / priced as f64)
    };

    tracing::info!(
        "Product '{}': total={}, transactions={}, average={:.2}",
        product_name,
        total_sales,
        total_transactions,
        average_sale
    );

    Some(ProductSales {
        product_name: product_name.to_string(),
        total_sales,
        total_transactions,
        average_sale,
    })
}

/// Per product id totals, joined to product names. Ids without a product get an empty name.
pub fn sales_summary(transactions: &Table, products: &Table) -> Vec<ProductSummary> {
    let mut grouped: BTreeMap<String, Vec<_>> = BTreeMap::new();
    for record in transactions.iter() {
        if let Some(key) = record.get(PRODUCT_ID_FIELD).and_then(id_key) {
            grouped.entry(key).or_default().push(record);
        }
    }

    let names: BTreeMap<String, String> = products
        .iter()
        .filter_map(|p| {
            let id = p.get("id").and_then(id_key)?;
            Some((id, p.get_str("name").unwrap_or_default().to_string()))
        })
        .collect();

    grouped
        .into_iter()
        .map(|(product_id, records)| {
            let (total_sales, total_transactions) = totals(records.into_iter());
            ProductSummary {
                name: names.get(&product_id).cloned().unwrap_or_default(),
                product_id,
                total_sales,
                total_transactions,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(rows: Vec<serde_json::Value>) -> Table {
        Table::new(
            rows.into_iter()
                .map(|v| serde_json::from_value(v).unwrap())
                .collect(),
        )
    }

    fn products() -> Table {
        table(vec![
            json!({"id": 1, "name": "Pellet"}),
            json!({"id": "2", "name": "Coal"}),
            json!({"id": 3, "name": "Wood"}),
        ])
    }

    fn transactions() -> Table {
        table(vec![
            json!({"transaction_id": 10, "product_id": 1, "amount": 10.0}),
            json!({"transaction_id": 11, "product_id": "1", "amount": 15.0}),
            json!({"transaction_id": 12, "product_id": 1, "amount": 0.333}),
            json!({"transaction_id": 13, "product_id": 2, "amount": 40}),
            json!({"transaction_id": 14, "product_id": 9, "amount": 5}),
        ])
    }

    #[test]
    fn test_analyze_product_case_insensitive() {
        let result = analyze_product(&transactions(), &products(), "pELLET").unwrap();
        assert_eq!(result.product_name, "pELLET");
        assert_eq!(result.total_transactions, 3);
        assert!((result.total_sales - 25.333).abs() < 1e-9);
        assert_eq!(result.average_sale, 8.44);
    }

    #[test]
    fn test_analyze_product_without_sales_and_unknown() {
        let result = analyze_product(&transactions(), &products(), "Wood").unwrap();
        assert_eq!(result.total_transactions, 0);
        assert_eq!(result.average_sale, 0.0);

        assert!(analyze_product(&transactions(), &products(), "Gas").is_none());
    }

    #[test]
    fn test_float_product_ids_join_integer_ids() {
        let products = table(vec![json!({"id": 10, "name": "Pellet"})]);
        let transactions = table(vec![
            json!({"transaction_id": 1, "product_id": 10.0, "amount": 12.5}),
            json!({"transaction_id": 2, "product_id": 10, "amount": 7.5}),
        ]);

        let result = analyze_product(&transactions, &products, "Pellet").unwrap();
        assert_eq!(result.total_transactions, 2);
        assert_eq!(result.total_sales, 20.0);

        let summary = sales_summary(&transactions, &products);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].product_id, "10");
        assert_eq!(summary[0].name, "Pellet");
        assert_eq!(summary[0].total_transactions, 2);
    }

    #[test]
    fn test_average_skips_non_numeric_amounts() {
        let transactions = table(vec![
            json!({"transaction_id": 1, "product_id": 1, "amount": 10.0}),
            json!({"transaction_id": 2, "product_id": 1, "amount": "n/a"}),
            json!({"transaction_id": 3, "product_id": 1, "amount": 20.0}),
        ]);

        let result = analyze_product(&transactions, &products(), "Pellet").unwrap();
        assert_eq!(result.total_transactions, 3);
        assert_eq!(result.total_sales, 30.0);
        assert_eq!(result.average_sale, 15.0);
    }

    #[test]
    fn test_sales_summary_left_joins_names() {
        let summary = sales_summary(&transactions(), &products());
        assert_eq!(summary.len(), 3);

        assert_eq!(summary[0].product_id, "1");
        assert_eq!(summary[0].name, "Pellet");
        assert_eq!(summary[0].total_transactions, 3);

        assert_eq!(summary[1].name, "Coal");
        assert_eq!(summary[1].total_sales, 40.0);

        assert_eq!(summary[2].product_id, "9");
        assert_eq!(summary[2].name, "");
    }
}
