//! `statement parse` - run a bank statement through the engine and print the
//! resulting rows.

use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use colored::Colorize;
use comfy_table::ContentArrangement;
use statement_core::config;
use statement_core::services::EngineService;

use crate::output;

#[allow(clippy::too_many_arguments)]
pub fn run(
    profile_path: PathBuf,
    input: PathBuf,
    parser_key: &str,
    content_type: Option<&str>,
    account_no: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let book = config::load_profiles(&profile_path)?;

    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string());
    let file = File::open(&input)?;

    let rows = EngineService::parse(
        file,
        filename.as_deref(),
        content_type,
        &book,
        parser_key,
        account_no,
    )?;

    if json {
        println!("{}", rows_to_json(&rows));
        return Ok(());
    }

    if rows.is_empty() {
        output::warning("No rows materialized.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Date", "Amount", "Balance", "Reference", "Order ID", "UTR", "Pay In",
    ]);
    for row in &rows {
        table.add_row(vec![
            row.transaction_date_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.amount.to_string(),
            row.balance.map(|b| b.to_string()).unwrap_or_default(),
            row.reference.clone(),
            row.order_id.clone().unwrap_or_default(),
            row.utr.clone().unwrap_or_default(),
            row.pay_in.to_string(),
        ]);
    }
    println!("{table}");
    println!();
    println!("{}", format!("{} row(s)", rows.len()).bold());

    Ok(())
}

fn rows_to_json(rows: &[statement_core::ParsedRow]) -> String {
    let values: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "transactionDateTime": row.transaction_date_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "amount": row.amount.to_string(),
                "balance": row.balance.map(|b| b.to_string()),
                "reference": row.reference,
                "orderId": row.order_id,
                "utr": row.utr,
                "payIn": row.pay_in,
            })
        })
        .collect();
    serde_json::to_string_pretty(&values).unwrap_or_default()
}
