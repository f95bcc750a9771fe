//! The add/edit expense form and the states it moves through.
//!
//! ```text
//! Closed --open_for_add/open_for_edit--> Open --submit--> Submitting
//!   ^                                     ^  |                |
//!   |                                     |  invalid          |
//!   |                                     +--+   failure      |
//!   |                                     +-------------------+
//!   +---------------- success or cancel --------------------+
//! ```

use time::PrimitiveDateTime;

use crate::{
    Error, ValidationError,
    alert::{Alert, AlertSink},
    category::{Category, CategoryId, default_category_ids, search_categories},
    codec::{
        api_date_to_form, api_time_to_form, form_date_to_api, form_time_to_api, format_form_date,
        format_form_time,
    },
    expense::{Expense, ExpenseApi, ExpenseId, ExpensePayload},
};

/// The message shown when the category list cannot be fetched.
pub const LOAD_CATEGORIES_FAILED: &str = "Failed to load categories";

/// Where the form is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormPhase {
    /// No form is shown.
    #[default]
    Closed,
    /// The form accepts edits and can be submitted.
    Open,
    /// The form has been sent to the backend and is waiting for the reply.
    Submitting,
}

/// What a call to [ExpenseFormController::submit] led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The expense was saved and the form closed. The caller should reload
    /// its expenses.
    Saved,
    /// A field is invalid. Nothing was sent and the form is still open.
    Invalid,
    /// The backend call failed. The form is open with the entered data.
    Failed,
}

/// The expense form fields as typed by the user.
///
/// The date and time are in the form formats "YYYY-MM-DD" and "HH:MM".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFormData {
    /// A short name for what the money was spent on.
    pub title: String,
    /// Optional free text.
    pub description: String,
    /// The amount spent, as typed.
    pub amount: String,
    /// The selected categories.
    pub category_ids: Vec<CategoryId>,
    /// The date of the expense.
    pub expense_date: String,
    /// The time of the expense.
    pub expense_time: String,
}

impl ExpenseFormData {
    /// An empty form dated `now`.
    pub fn new(now: PrimitiveDateTime) -> Self {
        Self {
            expense_date: format_form_date(now.date()),
            expense_time: format_form_time(now.time()),
            ..Default::default()
        }
    }

    /// A form holding the values of `expense`.
    ///
    /// A date or time the codec cannot read is replaced with `now`.
    pub fn from_expense(expense: &Expense, now: PrimitiveDateTime) -> Self {
        Self {
            title: expense.title.clone(),
            description: expense.description.clone().unwrap_or_default(),
            amount: expense.amount.to_string(),
            category_ids: expense.category_ids(),
            expense_date: api_date_to_form(&expense.expense_date, now.date()),
            expense_time: api_time_to_form(&expense.expense_time, now.time()),
        }
    }

    /// Check the fields in order and build the request body.
    ///
    /// # Errors
    /// Returns the first failed check: [ValidationError::MissingTitle],
    /// [ValidationError::MissingAmount], [ValidationError::InvalidAmount],
    /// [ValidationError::MissingCategory], [ValidationError::MissingDate] or
    /// [ValidationError::MissingTime].
    pub fn validate(&self) -> Result<ExpensePayload, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }

        let amount = self.amount.trim();
        if amount.is_empty() {
            return Err(ValidationError::MissingAmount);
        }

        let amount = amount
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite() && *amount > 0.0)
            .ok_or(ValidationError::InvalidAmount)?;

        if self.category_ids.is_empty() {
            return Err(ValidationError::MissingCategory);
        }

        let expense_date = self.expense_date.trim();
        if expense_date.is_empty() {
            return Err(ValidationError::MissingDate);
        }

        let expense_time = self.expense_time.trim();
        if expense_time.is_empty() {
            return Err(ValidationError::MissingTime);
        }

        let description = self.description.trim();

        Ok(ExpensePayload {
            title: title.to_owned(),
            description: (!description.is_empty()).then(|| description.to_owned()),
            amount,
            categories: self.category_ids.clone(),
            expense_date: form_date_to_api(expense_date),
            expense_time: form_time_to_api(expense_time),
        })
    }
}

/// Drives a single add or edit session of the expense form.
#[derive(Debug, Default)]
pub struct ExpenseFormController {
    phase: FormPhase,
    form: ExpenseFormData,
    editing_id: Option<ExpenseId>,
    categories: Vec<Category>,
    error: Option<String>,
    category_error: Option<String>,
}

impl ExpenseFormController {
    /// A closed form with no categories loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current phase.
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// The entered values.
    pub fn form(&self) -> &ExpenseFormData {
        &self.form
    }

    /// The entered values, for editing.
    ///
    /// # Errors
    /// Returns [Error::FormNotOpen] unless the form is open.
    pub fn form_mut(&mut self) -> Result<&mut ExpenseFormData, Error> {
        self.require_open()?;

        Ok(&mut self.form)
    }

    /// The ID of the expense being edited, `None` when adding.
    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    /// The message explaining why the last submission did not go through.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The message explaining why the categories could not be loaded.
    pub fn category_error(&self) -> Option<&str> {
        self.category_error.as_deref()
    }

    /// The categories that can be selected.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The categories whose names contain `query`, ignoring case.
    pub fn search_categories(&self, query: &str) -> Vec<&Category> {
        search_categories(&self.categories, query)
    }

    /// Open an empty form dated `now` for a new expense.
    pub fn open_for_add(&mut self, now: PrimitiveDateTime) {
        self.phase = FormPhase::Open;
        self.form = ExpenseFormData::new(now);
        self.editing_id = None;
        self.error = None;
        self.select_default_categories();
    }

    /// Open the form with the values of `expense` for editing.
    pub fn open_for_edit(&mut self, expense: &Expense, now: PrimitiveDateTime) {
        self.phase = FormPhase::Open;
        self.form = ExpenseFormData::from_expense(expense, now);
        self.editing_id = Some(expense.id.clone());
        self.error = None;
    }

    /// Close the form and discard the entered values.
    pub fn cancel(&mut self) {
        self.phase = FormPhase::Closed;
        self.form = ExpenseFormData::default();
        self.editing_id = None;
        self.error = None;
    }

    /// Replace the selectable categories.
    ///
    /// A new expense with nothing selected gets the default categories.
    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
        self.category_error = None;
        self.select_default_categories();
    }

    /// Fetch the selectable categories from the backend.
    ///
    /// On failure the category error is set and the form is left as it was.
    pub async fn load_categories(&mut self, api: &impl ExpenseApi) {
        match api.list_categories().await {
            Ok(categories) => self.set_categories(categories),
            Err(error) => {
                tracing::error!("Could not load categories: {error}");
                self.category_error = Some(LOAD_CATEGORIES_FAILED.to_owned());
            }
        }
    }

    /// Select `category_id` if it is not selected, otherwise deselect it.
    ///
    /// # Errors
    /// Returns [Error::FormNotOpen] unless the form is open.
    pub fn toggle_category(&mut self, category_id: &str) -> Result<(), Error> {
        self.require_open()?;

        let selected = &mut self.form.category_ids;

        match selected.iter().position(|id| id == category_id) {
            Some(index) => {
                selected.remove(index);
            }
            None => selected.push(category_id.to_owned()),
        }

        Ok(())
    }

    /// Validate the form and save it through `api`.
    ///
    /// On success the form closes and a success alert is pushed to `alerts`.
    /// On failure the form stays open with the entered data and an error
    /// message.
    ///
    /// # Errors
    /// Returns [Error::FormNotOpen] unless the form is open, which also
    /// rejects a second submit while one is in flight.
    pub async fn submit(
        &mut self,
        api: &impl ExpenseApi,
        alerts: &mut impl AlertSink,
    ) -> Result<SubmitOutcome, Error> {
        self.require_open()?;

        let payload = match self.form.validate() {
            Ok(payload) => payload,
            Err(error) => {
                tracing::debug!("Expense form is invalid: {error}");
                self.error = Some(error.to_string());
                return Ok(SubmitOutcome::Invalid);
            }
        };

        self.error = None;
        self.phase = FormPhase::Submitting;

        let result = match self.editing_id.as_deref() {
            Some(id) => api.update_expense(id, &payload).await,
            None => api.create_expense(&payload).await,
        };

        let is_edit = self.editing_id.is_some();

        match result {
            Ok(()) => {
                let message = if is_edit {
                    "Expense updated"
                } else {
                    "Expense added"
                };
                tracing::info!("{message}: {}", payload.title);
                alerts.push(Alert::success(message));
                self.cancel();

                Ok(SubmitOutcome::Saved)
            }
            Err(error) => {
                let message = if is_edit {
                    "Failed to update expense. Please try again."
                } else {
                    "Failed to add expense. Please try again."
                };
                tracing::error!("Could not save expense: {error}");
                alerts.push(error.into_alert(message));
                self.error = Some(message.to_owned());
                self.phase = FormPhase::Open;

                Ok(SubmitOutcome::Failed)
            }
        }
    }

    fn require_open(&self) -> Result<(), Error> {
        if self.phase == FormPhase::Open {
            Ok(())
        } else {
            Err(Error::FormNotOpen)
        }
    }

    fn select_default_categories(&mut self) {
        if self.phase == FormPhase::Open
            && self.editing_id.is_none()
            && self.form.category_ids.is_empty()
        {
            self.form.category_ids = default_category_ids(&self.categories);
        }
    }
}
