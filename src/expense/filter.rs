//! Narrowing a list of expenses by category, date range and amount range.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::CategoryId,
    codec::{form_date_to_api, format_form_date, parse_api_date, parse_form_date},
    expense::Expense,
};

/// Where filtering happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Fetch every expense once and filter the list locally on each change.
    #[default]
    Local,
    /// Send the criteria to the backend on each change and show what it returns.
    Remote,
}

impl FromStr for FilterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(Error::InvalidFilter("mode", other.to_owned())),
        }
    }
}

/// The criteria an expense must meet to be shown.
///
/// Absent criteria impose no constraint. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Keep expenses that belong to this category.
    pub category_id: Option<CategoryId>,
    /// Keep expenses on or after this date.
    pub start_date: Option<Date>,
    /// Keep expenses on or before this date.
    pub end_date: Option<Date>,
    /// Keep expenses of at least this amount.
    ///
    /// Zero is a real bound, not "no constraint".
    pub min_amount: Option<f64>,
    /// Keep expenses of at most this amount.
    pub max_amount: Option<f64>,
}

impl ExpenseFilter {
    /// Whether no criteria are set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `expense` meets every criterion that is set.
    pub fn matches(&self, expense: &Expense) -> bool {
        if self
            .category_id
            .as_deref()
            .is_some_and(|category_id| !expense.has_category(category_id))
        {
            return false;
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            // An unparsable date cannot be shown to fall inside the range.
            let Some(expense_date) = parse_api_date(&expense.expense_date) else {
                return false;
            };

            if self.start_date.is_some_and(|start| expense_date < start) {
                return false;
            }

            if self.end_date.is_some_and(|end| expense_date > end) {
                return false;
            }
        }

        if self.min_amount.is_some_and(|min| expense.amount < min) {
            return false;
        }

        if self.max_amount.is_some_and(|max| expense.amount > max) {
            return false;
        }

        true
    }

    /// The query parameters that ask the backend to apply this filter.
    pub fn to_query(&self) -> ExpenseQuery {
        ExpenseQuery {
            category_id: self.category_id.clone(),
            start_date: self
                .start_date
                .map(|date| form_date_to_api(&format_form_date(date))),
            end_date: self
                .end_date
                .map(|date| form_date_to_api(&format_form_date(date))),
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        }
    }
}

/// Return the expenses that meet every criterion in `filter`, in their
/// original order.
///
/// `expenses` is not modified. An empty filter returns every expense.
pub fn filter_expenses(expenses: &[Expense], filter: &ExpenseFilter) -> Vec<Expense> {
    expenses
        .iter()
        .filter(|expense| filter.matches(expense))
        .cloned()
        .collect()
}

/// The query parameters accepted by `GET /expenses`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpenseQuery {
    /// Only return expenses in this category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    /// Earliest date in the wire format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Latest date in the wire format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Smallest amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    /// Largest amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
}

/// The filter criteria as typed by the user.
///
/// Dates use the form format "YYYY-MM-DD". Empty fields mean no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterForm {
    /// The selected category, empty for all categories.
    pub category_id: String,
    /// The "from" date.
    pub start_date: String,
    /// The "to" date.
    pub end_date: String,
    /// The smallest amount.
    pub min_amount: String,
    /// The largest amount.
    pub max_amount: String,
}

impl FilterForm {
    /// Parse the form into filter criteria.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidFilter] naming the first field that holds text
    /// that is not a valid date or a non-negative number.
    pub fn parse(&self) -> Result<ExpenseFilter, Error> {
        Ok(ExpenseFilter {
            category_id: non_empty(&self.category_id).map(str::to_owned),
            start_date: parse_date_field("start_date", &self.start_date)?,
            end_date: parse_date_field("end_date", &self.end_date)?,
            min_amount: parse_amount_field("min_amount", &self.min_amount)?,
            max_amount: parse_amount_field("max_amount", &self.max_amount)?,
        })
    }

    /// Reset every field to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn non_empty(text: &str) -> Option<&str> {
    let text = text.trim();

    if text.is_empty() { None } else { Some(text) }
}

fn parse_date_field(field: &'static str, text: &str) -> Result<Option<Date>, Error> {
    non_empty(text)
        .map(|text| {
            parse_form_date(text).ok_or_else(|| Error::InvalidFilter(field, text.to_owned()))
        })
        .transpose()
}

fn parse_amount_field(field: &'static str, text: &str) -> Result<Option<f64>, Error> {
    non_empty(text)
        .map(|text| match text.parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
            _ => Err(Error::InvalidFilter(field, text.to_owned())),
        })
        .transpose()
}
