//! Expenses: the models, filtering, the list screen and the add/edit form.

mod filter;
mod form;
mod list;
mod models;

pub use filter::{ExpenseFilter, ExpenseQuery, FilterForm, FilterMode, filter_expenses};
pub use form::{ExpenseFormController, ExpenseFormData, FormPhase, SubmitOutcome};
pub use list::ExpenseList;
pub use models::{Expense, ExpenseCategory, ExpenseId, ExpensePayload};

use crate::{Error, category::Category};

/// The backend calls the expense screens depend on.
///
/// Implemented by [crate::api::ApiClient], and by fakes in tests.
#[allow(async_fn_in_trait)]
pub trait ExpenseApi {
    /// Fetch expenses, narrowed by `query` if given.
    async fn list_expenses(&self, query: Option<&ExpenseQuery>) -> Result<Vec<Expense>, Error>;

    /// Create a new expense.
    async fn create_expense(&self, payload: &ExpensePayload) -> Result<(), Error>;

    /// Replace the expense with ID `id`.
    async fn update_expense(&self, id: &str, payload: &ExpensePayload) -> Result<(), Error>;

    /// Delete the expense with ID `id`.
    async fn delete_expense(&self, id: &str) -> Result<(), Error>;

    /// Fetch the user's categories.
    async fn list_categories(&self) -> Result<Vec<Category>, Error>;
}
