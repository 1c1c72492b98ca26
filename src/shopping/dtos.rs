use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;

pub const DEFAULT_LIST_NAME: &str = "Shopping List";

fn default_unit() -> String {
    "g".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub meals: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListRequest {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub list_name: Option<String>,
}

impl ShoppingListRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ingredients.is_empty() {
            return Err(ValidationError::new("No ingredients provided"));
        }
        if let Some(bad) = self
            .ingredients
            .iter()
            .find(|i| i.name.trim().is_empty() || !i.amount.is_finite() || i.amount < 0.0)
        {
            return Err(ValidationError::new(format!(
                "Invalid ingredient '{}': needs a name and a non-negative amount",
                bad.name
            )));
        }
        Ok(())
    }

    pub fn list_name(&self) -> &str {
        self.list_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(DEFAULT_LIST_NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReminderResult {
    pub ingredient: String,
    pub title: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShoppingSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShoppingListResponse {
    pub success: bool,
    pub summary: ShoppingSummary,
    pub results: Vec<ReminderResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderList {
    pub name: String,
    pub item_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReminderListsResponse {
    pub success: bool,
    pub lists: Vec<ReminderList>,
}
