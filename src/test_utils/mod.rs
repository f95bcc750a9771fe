#![allow(missing_docs)]

use std::sync::Mutex;

use crate::{
    Error,
    api::{ApiError, ApiErrorKind},
    category::Category,
    expense::{Expense, ExpenseApi, ExpenseCategory, ExpensePayload, ExpenseQuery},
};

pub(crate) fn category(id: &str, name: &str, is_default: bool) -> Category {
    Category {
        id: id.to_owned(),
        name: name.to_owned(),
        is_default,
        created_at: None,
        updated_at: None,
    }
}

/// An expense with no categories at `amount` on the wire-format `date`.
pub(crate) fn expense(id: &str, amount: f64, date: &str) -> Expense {
    Expense {
        id: id.to_owned(),
        user_id: None,
        title: format!("Expense {id}"),
        description: None,
        amount,
        expense_date: date.to_owned(),
        expense_time: "12:00 PM".to_owned(),
        categories: Vec::new(),
        category_id: None,
        category_name: None,
        created_at: None,
        updated_at: None,
    }
}

/// An expense in the categories `category_ids`, each named after its ID.
pub(crate) fn expense_with_categories(id: &str, category_ids: &[&str]) -> Expense {
    Expense {
        categories: category_ids
            .iter()
            .map(|category_id| ExpenseCategory {
                id: (*category_id).to_owned(),
                name: (*category_id).to_owned(),
                is_default: None,
            })
            .collect(),
        ..expense(id, 1.0, "01-01-2025")
    }
}

/// An in-memory backend that records the calls made to it.
#[derive(Default)]
pub(crate) struct FakeExpenseApi {
    expenses: Mutex<Vec<Expense>>,
    categories: Vec<Category>,
    failing: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeExpenseApi {
    pub(crate) fn with_expenses(expenses: Vec<Expense>) -> Self {
        Self {
            expenses: Mutex::new(expenses),
            ..Default::default()
        }
    }

    pub(crate) fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            categories,
            ..Default::default()
        }
    }

    /// Every call fails with a server error.
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn expenses(&self) -> Vec<Expense> {
        self.expenses.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), Error> {
        self.calls.lock().unwrap().push(call);

        if self.failing {
            Err(Error::Api(ApiError {
                kind: ApiErrorKind::Status,
                status: Some(500),
                message: "Internal server error".to_owned(),
            }))
        } else {
            Ok(())
        }
    }
}

impl ExpenseApi for FakeExpenseApi {
    async fn list_expenses(&self, query: Option<&ExpenseQuery>) -> Result<Vec<Expense>, Error> {
        let query = query
            .map(|query| serde_urlencoded::to_string(query).unwrap())
            .unwrap_or_default();
        self.record(format!("list_expenses {query}").trim_end().to_owned())?;

        Ok(self.expenses())
    }

    async fn create_expense(&self, payload: &ExpensePayload) -> Result<(), Error> {
        self.record(format!(
            "create_expense {} {} {}",
            payload.title, payload.expense_date, payload.expense_time
        ))
    }

    async fn update_expense(&self, id: &str, payload: &ExpensePayload) -> Result<(), Error> {
        self.record(format!("update_expense {id} {}", payload.title))
    }

    async fn delete_expense(&self, id: &str) -> Result<(), Error> {
        self.record(format!("delete_expense {id}"))?;
        self.expenses
            .lock()
            .unwrap()
            .retain(|expense| expense.id != id);

        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        self.record("list_categories".to_owned())?;

        Ok(self.categories.clone())
    }
}
