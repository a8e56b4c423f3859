//! Finance context formatter
//!
//! Flattens a [`FinanceInfo`] snapshot into plain-text paragraphs that are
//! appended to the model's system prompt. Optional fields are only printed
//! when present.

use crate::models::{Account, Budget, ExportInfo, FinanceInfo, Transaction, TransactionType};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// Formatter settings, chosen per deployment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOptions {
    /// Show only the last four digits of account numbers
    pub mask_account_numbers: bool,
    /// List only the newest N transactions instead of all of them
    pub transaction_limit: Option<usize>,
}

/// Flatten the finance snapshot into readable text
pub fn flatten_finance_info(info: &FinanceInfo, options: &ContextOptions) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(export) = &info.export_info {
        push_export_summary(&mut parts, export);
    }

    if let Some(accounts) = info.accounts.as_deref().filter(|a| !a.is_empty()) {
        parts.push(format!("\n\nAccounts ({} total):", accounts.len()));
        parts.extend(accounts.iter().map(|acc| account_line(acc, options)));
    }

    if let Some(budgets) = info.budgets.as_deref().filter(|b| !b.is_empty()) {
        parts.push(format!("\n\nBudgets ({} total):", budgets.len()));
        parts.extend(budgets.iter().map(budget_line));
    }

    if let Some(transactions) = info.transactions.as_deref().filter(|t| !t.is_empty()) {
        push_transactions(&mut parts, transactions, options);
    }

    parts.join("\n")
}

/// Render an amount in rupees
pub fn format_inr(amount: f64) -> String {
    format!("₹{:.2}", amount)
}

/// Keep only the last four characters of an account number
pub fn mask_account_number(number: &str) -> String {
    let chars: Vec<char> = number.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.len() <= 4 {
        return chars.into_iter().collect();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn push_export_summary(parts: &mut Vec<String>, export: &ExportInfo) {
    let mut origin = String::from("Financial data exported");
    if let Some(date) = &export.export_date {
        origin.push_str(&format!(" on {}", format_timestamp(date)));
    }
    if let Some(version) = &export.app_version {
        origin.push_str(&format!(" using app version {}", version));
    }
    origin.push('.');
    parts.push(origin);

    let mut details = Vec::new();
    if let Some(format) = &export.data_format {
        details.push(format!("Data format: {}.", format));
    }

    let totals: Vec<String> = [
        (export.total_transactions, "transactions"),
        (export.total_accounts, "accounts"),
        (export.total_budgets, "budgets"),
    ]
    .iter()
    .filter_map(|(count, label)| count.map(|n| format!("{} {}", n, label)))
    .collect();

    if !totals.is_empty() {
        details.push(format!("Total records: {}.", totals.join(", ")));
    }

    if !details.is_empty() {
        parts.push(details.join(" "));
    }
}

fn account_line(acc: &Account, options: &ContextOptions) -> String {
    let mut line = String::from("- Account");
    let mut fields: Vec<String> = Vec::new();

    if let Some(id) = acc.id {
        fields.push(format!("ID: {}", id));
    }
    if let Some(name) = &acc.account_name {
        fields.push(format!("Name: {}", name));
    }
    if let Some(number) = &acc.account_number {
        let shown = if options.mask_account_numbers {
            mask_account_number(number)
        } else {
            number.clone()
        };
        fields.push(format!("Number: {}", shown));
    }
    if let Some(bank) = &acc.bank_name {
        fields.push(format!("Bank: {}", bank));
    }
    if let Some(kind) = &acc.account_type {
        fields.push(format!("Type: {}", kind));
    }
    if let Some(balance) = acc.balance {
        fields.push(format!("Balance: {}", format_inr(balance)));
    }
    if let Some(active) = acc.is_active {
        fields.push(format!(
            "Status: {}",
            if active { "Active" } else { "Inactive" }
        ));
    }
    if let Some(ifsc) = &acc.ifsc_code {
        fields.push(format!("IFSC: {}", ifsc));
    }
    if let Some(branch) = &acc.branch_name {
        fields.push(format!("Branch: {}", branch));
    }
    if let Some(description) = &acc.description {
        fields.push(format!("Description: {}", description));
    }
    if let Some(created) = &acc.created_at {
        fields.push(format!("Created: {}", format_timestamp(created)));
    }
    if let Some(updated) = &acc.updated_at {
        fields.push(format!("Updated: {}", format_timestamp(updated)));
    }

    for field in fields {
        line.push_str(" | ");
        line.push_str(&field);
    }
    line
}

fn budget_line(budget: &Budget) -> String {
    let mut line = String::from("- Budget");

    if let Some(id) = budget.id {
        line.push_str(&format!(" | ID: {}", id));
    }
    match (budget.year, budget.month) {
        (Some(year), Some(month)) => line.push_str(&format!(" | Period: {}/{:02}", year, month)),
        (Some(year), None) => line.push_str(&format!(" | Period: {}", year)),
        _ => {}
    }
    if let Some(amount) = budget.amount {
        line.push_str(&format!(" | Amount: {}", format_inr(amount)));
    }
    if let Some(created) = &budget.created_at {
        line.push_str(&format!(" | Created: {}", format_timestamp(created)));
    }
    if let Some(updated) = &budget.updated_at {
        line.push_str(&format!(" | Updated: {}", format_timestamp(updated)));
    }
    line
}

fn push_transactions(parts: &mut Vec<String>, transactions: &[Transaction], options: &ContextOptions) {
    parts.push(format!("\n\nTransactions ({} total):", transactions.len()));

    for (kind, label) in [
        (TransactionType::Credit, "Credit"),
        (TransactionType::Debit, "Debit"),
        (TransactionType::Transfer, "Transfer"),
    ] {
        let (count, total) = transactions
            .iter()
            .filter(|t| t.kind == Some(kind))
            .fold((0usize, 0.0f64), |(n, sum), t| (n + 1, sum + t.amount.unwrap_or(0.0)));

        if count > 0 {
            parts.push(format!(
                "  {} transactions: {} totaling {}",
                label,
                count,
                format_inr(total)
            ));
        }
    }

    match options.transaction_limit {
        Some(limit) if limit < transactions.len() => {
            let mut recent: Vec<&Transaction> = transactions.iter().collect();
            // Newest first; undated entries sink to the end in input order
            recent.sort_by_key(|t| (t.date.is_none(), Reverse(t.date)));
            recent.truncate(limit);

            parts.push(format!(
                "\n  Recent Transactions (latest {} of {}):",
                recent.len(),
                transactions.len()
            ));
            parts.extend(recent.into_iter().map(transaction_line));
        }
        _ => {
            parts.push("\n  All Transactions Details:".to_string());
            parts.extend(transactions.iter().map(transaction_line));
        }
    }
}

fn transaction_line(t: &Transaction) -> String {
    let mut line = String::from("  - Transaction");

    if let Some(id) = t.id {
        line.push_str(&format!(" | ID: {}", id));
    }
    if let Some(date) = &t.date {
        line.push_str(&format!(" | Date: {}", format_timestamp(date)));
    }
    if let Some(kind) = t.kind {
        line.push_str(&format!(" | Type: {}", kind));
    }
    if let Some(title) = &t.title {
        line.push_str(&format!(" | Title: {}", title));
    }
    if let Some(amount) = t.amount {
        line.push_str(&format!(" | Amount: {}", format_inr(amount)));
    }
    if let Some(category) = &t.category {
        line.push_str(&format!(" | Category: {}", category));
    }
    if let Some(account_id) = t.account_id {
        line.push_str(&format!(" | Account ID: {}", account_id));
    }
    if let Some(location) = &t.location {
        line.push_str(&format!(" | Location: {}", location));
    }
    if let Some(description) = &t.description {
        line.push_str(&format!(" | Description: {}", description));
    }
    if let Some(sms) = &t.sms_content {
        line.push_str(&format!(" | SMS: {}", sms));
    }
    if let Some(photos) = t.photos.as_ref().filter(|p| !p.is_empty()) {
        line.push_str(&format!(" | Photos: {} attached", photos.len()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn txn(kind: TransactionType, amount: Option<f64>, day: Option<u32>, title: &str) -> Transaction {
        Transaction {
            kind: Some(kind),
            amount,
            date: day.map(|d| Utc.with_ymd_and_hms(2025, 11, d, 10, 0, 0).unwrap()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn sample_info() -> FinanceInfo {
        FinanceInfo {
            export_info: Some(ExportInfo {
                app_version: Some("2.1.0".to_string()),
                total_transactions: Some(4),
                ..Default::default()
            }),
            accounts: Some(vec![Account {
                account_name: Some("Salary".to_string()),
                account_number: Some("1234567252".to_string()),
                bank_name: Some("Indian Bank".to_string()),
                balance: Some(-49533.32),
                is_active: Some(true),
                ..Default::default()
            }]),
            budgets: Some(vec![Budget {
                year: Some(2025),
                month: Some(3),
                amount: Some(8000.0),
                ..Default::default()
            }]),
            transactions: Some(vec![
                txn(TransactionType::Credit, Some(54868.0), Some(1), "Salary"),
                txn(TransactionType::Debit, Some(1154.0), Some(3), "Swiggy"),
                txn(TransactionType::Debit, None, None, "Unknown"),
                txn(TransactionType::Transfer, Some(50000.0), Some(2), "Rent"),
            ]),
        }
    }

    #[test]
    fn test_empty_snapshot_is_empty_text() {
        let text = flatten_finance_info(&FinanceInfo::default(), &ContextOptions::default());
        assert!(text.is_empty());
    }

    #[test]
    fn test_sections_and_totals() {
        let text = flatten_finance_info(&sample_info(), &ContextOptions::default());

        assert!(text.contains("Financial data exported using app version 2.1.0."));
        assert!(text.contains("Total records: 4 transactions."));
        assert!(text.contains("Accounts (1 total):"));
        assert!(text.contains(
            "- Account | Name: Salary | Number: 1234567252 | Bank: Indian Bank | Balance: ₹-49533.32 | Status: Active"
        ));
        assert!(text.contains("- Budget | Period: 2025/03 | Amount: ₹8000.00"));
        assert!(text.contains("Transactions (4 total):"));
        assert!(text.contains("  Credit transactions: 1 totaling ₹54868.00"));
        assert!(text.contains("  Debit transactions: 2 totaling ₹1154.00"));
        assert!(text.contains("  Transfer transactions: 1 totaling ₹50000.00"));
        assert!(text.contains("All Transactions Details:"));
        assert!(text.contains("  - Transaction | Type: debit | Title: Unknown"));
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let text = flatten_finance_info(&sample_info(), &ContextOptions::default());
        assert!(!text.contains("None"));
        assert!(!text.contains("IFSC"));
        assert!(!text.contains("Data format"));
        assert!(!text.contains("Photos"));
    }

    #[test]
    fn test_masked_account_numbers() {
        let options = ContextOptions {
            mask_account_numbers: true,
            ..Default::default()
        };
        let text = flatten_finance_info(&sample_info(), &options);
        assert!(text.contains("Number: ****7252"));
        assert!(!text.contains("1234567252"));

        assert_eq!(mask_account_number("72 52"), "7252");
        assert_eq!(mask_account_number("99999996244"), "****6244");
    }

    #[test]
    fn test_recent_listing_is_capped_newest_first() {
        let options = ContextOptions {
            transaction_limit: Some(2),
            ..Default::default()
        };
        let text = flatten_finance_info(&sample_info(), &options);

        assert!(text.contains("Recent Transactions (latest 2 of 4):"));
        assert!(!text.contains("All Transactions Details:"));

        let swiggy = text.find("Title: Swiggy").unwrap();
        let rent = text.find("Title: Rent").unwrap();
        assert!(swiggy < rent);
        assert!(!text.contains("Title: Salary |"));
        assert!(!text.contains("Title: Unknown"));

        // Summaries still cover every transaction
        assert!(text.contains("  Debit transactions: 2 totaling ₹1154.00"));
    }

    #[test]
    fn test_limit_larger_than_list_shows_everything() {
        let options = ContextOptions {
            transaction_limit: Some(10),
            ..Default::default()
        };
        let text = flatten_finance_info(&sample_info(), &options);
        assert!(text.contains("All Transactions Details:"));
    }
}
