//! The REST client for the expense tracker backend.

mod client;
mod error;
mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind, ErrorBody};
pub use types::{
    CategoriesResponse, DashboardResponse, ExpensesResponse, MessageResponse, ProfileResponse,
};
