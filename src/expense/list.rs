//! The expense list screen: what is loaded, how it is filtered, what is shown.

use crate::{
    Error,
    expense::{Expense, ExpenseApi, ExpenseFilter, FilterMode, filter_expenses},
};

/// The expenses shown on the list screen.
///
/// In [FilterMode::Local] every expense is fetched once and each filter
/// change is applied to that copy without a network call. In
/// [FilterMode::Remote] each filter change asks the backend for the
/// matching expenses.
#[derive(Debug, Clone, Default)]
pub struct ExpenseList {
    mode: FilterMode,
    base: Vec<Expense>,
    filter: ExpenseFilter,
    visible: Vec<Expense>,
}

impl ExpenseList {
    /// An empty list that filters in `mode`.
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Where filtering happens.
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// The active filter.
    pub fn filter(&self) -> &ExpenseFilter {
        &self.filter
    }

    /// The expenses to show.
    pub fn expenses(&self) -> &[Expense] {
        &self.visible
    }

    /// Fetch the expenses and apply the active filter.
    ///
    /// # Errors
    /// Returns the API error. The previously loaded expenses are kept.
    pub async fn load(&mut self, api: &impl ExpenseApi) -> Result<(), Error> {
        match self.mode {
            FilterMode::Local => {
                self.base = api.list_expenses(None).await?;
                self.visible = filter_expenses(&self.base, &self.filter);
            }
            FilterMode::Remote => {
                let query = (!self.filter.is_empty()).then(|| self.filter.to_query());
                self.visible = api.list_expenses(query.as_ref()).await?;
            }
        }

        tracing::debug!("Showing {} expenses", self.visible.len());

        Ok(())
    }

    /// Replace the active filter and update the shown expenses.
    ///
    /// # Errors
    /// Returns the API error in [FilterMode::Remote]. Local filtering
    /// cannot fail.
    pub async fn apply_filter(
        &mut self,
        api: &impl ExpenseApi,
        filter: ExpenseFilter,
    ) -> Result<(), Error> {
        self.filter = filter;

        match self.mode {
            FilterMode::Local => {
                self.visible = filter_expenses(&self.base, &self.filter);
                Ok(())
            }
            FilterMode::Remote => self.load(api).await,
        }
    }

    /// Remove the active filter.
    ///
    /// # Errors
    /// See [ExpenseList::apply_filter].
    pub async fn clear_filter(&mut self, api: &impl ExpenseApi) -> Result<(), Error> {
        self.apply_filter(api, ExpenseFilter::default()).await
    }

    /// Delete the expense with ID `id` and reload.
    ///
    /// Asking the user for confirmation is up to the caller.
    ///
    /// # Errors
    /// Returns the API error of the delete or of the reload.
    pub async fn delete(&mut self, api: &impl ExpenseApi, id: &str) -> Result<(), Error> {
        api.delete_expense(id).await?;
        tracing::info!("Deleted expense {id}");

        self.load(api).await
    }
}
