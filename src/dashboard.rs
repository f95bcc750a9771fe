//! The spending overview shown after logging in.

use serde::Deserialize;

use crate::{expense::ExpenseId, format::format_currency};

/// Total spent on one day.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailySummary {
    /// The day, as labelled by the backend.
    pub day: String,
    /// The amount spent that day.
    pub total: f64,
}

/// Total spent in one week.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeeklySummary {
    /// The week, as labelled by the backend.
    pub week: String,
    /// The amount spent that week.
    pub total: f64,
}

/// Total spent in one month.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthlySummary {
    /// The month, as labelled by the backend.
    pub month: String,
    /// The amount spent that month.
    pub total: f64,
}

/// One of the latest expenses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecentExpense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// What the money was spent on.
    pub title: String,
    /// The amount spent.
    pub amount: f64,
    /// The date in the wire format.
    pub expense_date: String,
    /// The time in the wire format.
    pub expense_time: String,
}

/// Headline totals and counts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Summary {
    /// Spent so far this month.
    pub current_month_amount: f64,
    /// Number of expenses this month.
    pub current_month_count: u64,
    /// Spent so far this week.
    pub current_week_amount: f64,
    /// Number of expenses this week.
    pub current_week_count: u64,
    /// Spent today.
    pub today_amount: f64,
    /// Number of expenses today.
    pub today_count: u64,
    /// Spent overall.
    pub total_amount: f64,
    /// Number of expenses overall.
    pub total_expenses: u64,
}

/// The aggregated figures returned by `GET /dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Dashboard {
    /// Totals per day.
    pub daily_summary: Vec<DailySummary>,
    /// Totals per week.
    pub weekly_summary: Vec<WeeklySummary>,
    /// Totals per month.
    pub monthly_summary: Vec<MonthlySummary>,
    /// The latest expenses.
    pub recent_expenses: Vec<RecentExpense>,
    /// Headline totals.
    pub summary: Summary,
}

/// Render the dashboard as lines of text.
pub fn summary_lines(dashboard: &Dashboard) -> Vec<String> {
    let summary = &dashboard.summary;

    let mut lines = vec![
        period_line("Today", summary.today_amount, summary.today_count),
        period_line(
            "This week",
            summary.current_week_amount,
            summary.current_week_count,
        ),
        period_line(
            "This month",
            summary.current_month_amount,
            summary.current_month_count,
        ),
        period_line("All time", summary.total_amount, summary.total_expenses),
    ];

    if !dashboard.monthly_summary.is_empty() {
        lines.push(String::new());
        lines.push("Monthly totals".to_owned());
        lines.extend(
            dashboard
                .monthly_summary
                .iter()
                .map(|month| format!("  {:<12} {}", month.month, format_currency(month.total))),
        );
    }

    lines.push(String::new());

    if dashboard.recent_expenses.is_empty() {
        lines.push("No recent expenses".to_owned());
    } else {
        lines.push("Recent expenses".to_owned());
        lines.extend(dashboard.recent_expenses.iter().map(|expense| {
            format!(
                "  {} {}  {}  {}",
                expense.expense_date,
                expense.expense_time,
                format_currency(expense.amount),
                expense.title
            )
        }));
    }

    lines
}

fn period_line(label: &str, amount: f64, count: u64) -> String {
    let noun = if count == 1 { "expense" } else { "expenses" };

    format!("{label:<11} {} ({count} {noun})", format_currency(amount))
}
