//! Defines the expense models exchanged with the backend.

use serde::{Deserialize, Serialize};

use crate::category::CategoryId;

/// Backend identifier for an expense.
pub type ExpenseId = String;

/// A category reference embedded in an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
    /// Whether the category is a default category.
    #[serde(default)]
    pub is_default: Option<bool>,
}

/// An event where money was spent, as returned by the backend.
///
/// Dates and times are kept in the wire format, "DD-MM-YYYY" and
/// "hh:mm AM/PM", see [crate::codec].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The owner of the expense.
    #[serde(default)]
    pub user_id: Option<String>,
    /// A short name for what the money was spent on.
    pub title: String,
    /// Optional free text.
    #[serde(default)]
    pub description: Option<String>,
    /// The amount spent, always greater than zero.
    pub amount: f64,
    /// The date of the expense in the wire format.
    pub expense_date: String,
    /// The time of the expense in the wire format.
    pub expense_time: String,
    /// The categories the expense belongs to.
    #[serde(default)]
    pub categories: Vec<ExpenseCategory>,
    /// The single category of expenses recorded by older backends.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// The name of the single category of expenses recorded by older backends.
    #[serde(default)]
    pub category_name: Option<String>,
    /// Server-assigned creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Server-assigned update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Expense {
    /// The IDs of the categories this expense belongs to.
    ///
    /// Falls back to the single `category_id` when the expense carries no
    /// category list.
    pub fn category_ids(&self) -> Vec<CategoryId> {
        if self.categories.is_empty() {
            self.category_id.iter().cloned().collect()
        } else {
            self.categories
                .iter()
                .map(|category| category.id.clone())
                .collect()
        }
    }

    /// Whether the expense belongs to the category `category_id`.
    pub fn has_category(&self, category_id: &str) -> bool {
        if self.categories.is_empty() {
            self.category_id.as_deref() == Some(category_id)
        } else {
            self.categories
                .iter()
                .any(|category| category.id == category_id)
        }
    }

    /// The category names joined for display, e.g. "Food, Travel".
    pub fn category_label(&self) -> String {
        if self.categories.is_empty() {
            self.category_name.clone().unwrap_or_default()
        } else {
            self.categories
                .iter()
                .map(|category| category.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// The request body for creating or replacing an expense.
///
/// Updates replace the whole expense, there is no partial patch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpensePayload {
    /// A short name for what the money was spent on.
    pub title: String,
    /// Optional free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The amount spent.
    pub amount: f64,
    /// The categories the expense belongs to.
    pub categories: Vec<CategoryId>,
    /// The date in the wire format "DD-MM-YYYY".
    pub expense_date: String,
    /// The time in the wire format "hh:mm AM/PM".
    pub expense_time: String,
}
