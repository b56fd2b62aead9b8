//! Financial payload → bounded plain-text block for persona prompts
//!
//! Only fields actually present are rendered; nothing is defaulted.

use crate::agent::extract::truncate_chars;
use serde_json::Value;

pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Render the most recent period of a financial payload.
///
/// Accepts the provider shape (`income_statements`, `ratios`, `key_metrics`
/// lists, newest first) and a flat shape with `revenue`/`netIncome`/`eps` at
/// the top level.
pub fn format_financial_data(data: &Value) -> String {
    let mut parts = Vec::new();

    if let Some(description) = text_field(data, &["description"]) {
        parts.push(format!(
            "Company: {}",
            truncate_chars(description, DESCRIPTION_MAX_CHARS)
        ));
    }
    if let Some(sector) = text_field(data, &["sector"]) {
        parts.push(format!("Sector: {}", sector));
    }
    if let Some(industry) = text_field(data, &["industry"]) {
        parts.push(format!("Industry: {}", industry));
    }
    if let Some(market_cap) = number_field(data, &["market_cap", "marketCap"]) {
        parts.push(format!("Market Cap: ${}", with_thousands(market_cap)));
    }

    let recent = first_entry(data, "income_statements").unwrap_or(data);
    push_block(
        &mut parts,
        "Recent Annual Financials:",
        [
            number_field(recent, &["revenue"]).map(|v| format!("  Revenue: ${}", with_thousands(v))),
            number_field(recent, &["netIncome", "net_income"])
                .map(|v| format!("  Net Income: ${}", with_thousands(v))),
            number_field(recent, &["eps"]).map(|v| format!("  EPS: ${:.2}", v)),
        ],
    );

    if let Some(ratios) = first_entry(data, "ratios") {
        push_block(
            &mut parts,
            "Key Ratios:",
            [
                number_field(ratios, &["returnOnEquity"]).map(|v| format!("  ROE: {:.1}%", v * 100.0)),
                number_field(ratios, &["priceEarningsRatio"]).map(|v| format!("  P/E: {:.1}", v)),
                number_field(ratios, &["debtEquityRatio"]).map(|v| format!("  Debt/Equity: {:.2}", v)),
            ],
        );
    }

    if let Some(metrics) = first_entry(data, "key_metrics") {
        push_block(
            &mut parts,
            "Key Metrics:",
            [
                number_field(metrics, &["revenuePerShare"])
                    .map(|v| format!("  Revenue/Share: ${:.2}", v)),
                number_field(metrics, &["freeCashFlowPerShare"])
                    .map(|v| format!("  FCF/Share: ${:.2}", v)),
            ],
        );
    }

    parts.join("\n")
}

/// Append a titled block, skipping the title when no line is present.
fn push_block<const N: usize>(parts: &mut Vec<String>, title: &str, lines: [Option<String>; N]) {
    let lines: Vec<String> = lines.into_iter().flatten().collect();
    if lines.is_empty() {
        return;
    }
    parts.push(format!("\n{}", title));
    parts.extend(lines);
}

fn first_entry<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.get(key)?.as_array()?.first()
}

fn text_field<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn number_field(data: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| data.get(*key).and_then(Value::as_f64))
        .filter(|v| v.is_finite())
}

/// `1234567.8` → `"1,234,568"`
fn with_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);

    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if value < 0.0 && rounded != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(with_thousands(0.0), "0");
        assert_eq!(with_thousands(999.0), "999");
        assert_eq!(with_thousands(1000.0), "1,000");
        assert_eq!(with_thousands(1234567.8), "1,234,568");
        assert_eq!(with_thousands(-2500000.0), "-2,500,000");
    }

    #[test]
    fn test_provider_shape() {
        let data = json!({
            "description": "Makes widgets.",
            "sector": "Industrials",
            "industry": "Machinery",
            "market_cap": 2500000000.0,
            "income_statements": [
                {"revenue": 1200000, "netIncome": 150000, "eps": 3.456},
                {"revenue": 1, "netIncome": 1, "eps": 1}
            ],
            "ratios": [{"returnOnEquity": 0.184, "priceEarningsRatio": 21.37, "debtEquityRatio": 0.5}],
            "key_metrics": [{"revenuePerShare": 12.0, "freeCashFlowPerShare": 4.25}]
        });

        let block = format_financial_data(&data);
        let expected = "Company: Makes widgets.\n\
                        Sector: Industrials\n\
                        Industry: Machinery\n\
                        Market Cap: $2,500,000,000\n\
                        \nRecent Annual Financials:\n  Revenue: $1,200,000\n  Net Income: $150,000\n  EPS: $3.46\n\
                        \nKey Ratios:\n  ROE: 18.4%\n  P/E: 21.4\n  Debt/Equity: 0.50\n\
                        \nKey Metrics:\n  Revenue/Share: $12.00\n  FCF/Share: $4.25";
        assert_eq!(block, expected);
    }

    #[test]
    fn test_flat_shape() {
        let block = format_financial_data(&json!({"revenue": 1000, "netIncome": 100}));
        assert_eq!(block, "\nRecent Annual Financials:\n  Revenue: $1,000\n  Net Income: $100");
    }

    #[test]
    fn test_missing_fields_are_omitted() {
        let block = format_financial_data(&json!({
            "sector": "Tech",
            "ratios": [{"priceEarningsRatio": null}],
            "key_metrics": []
        }));
        assert_eq!(block, "Sector: Tech");
        assert!(!block.contains("N/A"));
        assert!(!block.contains("Key Ratios"));
    }

    #[test]
    fn test_description_truncated() {
        let long = "x".repeat(2000);
        let block = format_financial_data(&json!({ "description": long }));
        assert_eq!(block.len(), "Company: ".len() + DESCRIPTION_MAX_CHARS);
    }
}
