//! Expense categories and the form used to create or rename them.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Backend identifier for a category.
pub type CategoryId = String;

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// Surrounding whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty
    /// or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CategoryName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CategoryName::new(&value)
    }
}

impl From<CategoryName> for String {
    fn from(value: CategoryName) -> Self {
        value.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-defined label for grouping expenses, e.g. "Groceries".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
    /// Whether the category is pre-selected when composing a new expense.
    #[serde(default)]
    pub is_default: bool,
    /// When the category was created, as reported by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
    /// When the category was last changed, as reported by the backend.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Form data for category creation and renaming.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryForm {
    /// The name as typed by the user.
    pub name: String,
    /// Whether the category should be selected by default for new expenses.
    pub is_default: bool,
}

impl CategoryForm {
    /// Check the form and build the request body.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyCategoryName] if the name is blank.
    pub fn validate(&self) -> Result<CategoryPayload, Error> {
        Ok(CategoryPayload {
            name: CategoryName::new(&self.name)?,
            is_default: self.is_default,
        })
    }
}

/// The request body for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPayload {
    /// The category name.
    pub name: CategoryName,
    /// Whether the category is selected by default for new expenses.
    pub is_default: bool,
}

/// The IDs of the categories flagged as default, in list order.
pub fn default_category_ids(categories: &[Category]) -> Vec<CategoryId> {
    categories
        .iter()
        .filter(|category| category.is_default)
        .map(|category| category.id.clone())
        .collect()
}

/// The categories whose names contain `query`, ignoring case.
///
/// An empty query matches every category.
pub fn search_categories<'a>(categories: &'a [Category], query: &str) -> Vec<&'a Category> {
    let query = query.to_lowercase();

    categories
        .iter()
        .filter(|category| category.name.to_lowercase().contains(&query))
        .collect()
}
