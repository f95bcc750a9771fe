//! The backend API endpoint paths, relative to the configured base URL.
//!
//! For endpoints that take a parameter, e.g., '/expenses/{expense_id}', use [format_endpoint].

/// The route for creating an account.
pub const REGISTER: &str = "/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/logout";
/// The route to read and update the user's profile.
pub const PROFILE: &str = "/profile";
/// The route to change the user's password.
pub const PROFILE_PASSWORD: &str = "/profile/password";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/categories";
/// The route to update or delete a single category.
pub const CATEGORY: &str = "/categories/{category_id}";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/expenses";
/// The route to update or delete a single expense.
pub const EXPENSE: &str = "/expenses/{expense_id}";
/// The route for the aggregated dashboard.
pub const DASHBOARD: &str = "/dashboard";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/expenses/{expense_id}', '{expense_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
