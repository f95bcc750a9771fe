//! Response envelopes returned by the backend.

use serde::Deserialize;

use crate::{
    category::Category,
    dashboard::Dashboard,
    expense::Expense,
    profile::Profile,
};

/// A body that only carries a status message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageResponse {
    /// A human-readable status message.
    #[serde(default)]
    pub message: String,
}

/// The body of `GET /categories`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoriesResponse {
    /// Every category of the logged in user.
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// The body of `GET /expenses`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpensesResponse {
    /// The expenses, newest first.
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

/// The body of `GET /profile`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileResponse {
    /// The logged in user's profile.
    pub profile: Profile,
}

/// The body of `GET /dashboard`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardResponse {
    /// The aggregated spending figures.
    pub dashboard: Dashboard,
}
