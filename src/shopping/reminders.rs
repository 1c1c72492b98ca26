use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use crate::shopping::command::{CommandError, CommandRunner};
use crate::shopping::dtos::{
    Ingredient, ReminderList, ReminderResult, ShoppingListResponse, ShoppingSummary,
};
use crate::shopping::format::reminder_title;

/// `"Groceries (12 items)"`
static LIST_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\((\d+)\s*item").unwrap());

/// Adds shopping list lines to a reminders app through its CLI.
#[derive(Clone)]
pub struct Reminders {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl Reminders {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Add one reminder; `Ok` carries the command's stdout, `Err` its
    /// stderr or the launch error.
    pub async fn add(&self, title: &str, list_name: &str) -> Result<String, String> {
        let args = [
            "add".to_string(),
            "--title".to_string(),
            title.to_string(),
            "--list".to_string(),
            list_name.to_string(),
        ];
        match self.runner.execute(&self.program, &args).await {
            Ok(output) if output.success() => Ok(output.stdout),
            Ok(output) => Err(output.stderr),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Add every ingredient in order. Individual failures are reported in
    /// the results and do not stop the rest.
    pub async fn add_all(&self, ingredients: &[Ingredient], list_name: &str) -> ShoppingListResponse {
        let mut results = Vec::with_capacity(ingredients.len());
        for ingredient in ingredients {
            let title = reminder_title(ingredient);
            let (success, message) = match self.add(&title, list_name).await {
                Ok(message) => (true, message),
                Err(message) => {
                    warn!(%title, %message, "reminder not added");
                    (false, message)
                }
            };
            results.push(ReminderResult {
                ingredient: ingredient.name.clone(),
                title,
                success,
                message,
            });
        }

        let successful = results.iter().filter(|r| r.success).count();
        let summary = ShoppingSummary {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        };
        info!(list_name, ?summary, "shopping list sent");
        ShoppingListResponse {
            success: true,
            summary,
            results,
        }
    }

    pub async fn lists(&self) -> Result<Vec<ReminderList>, CommandError> {
        let output = self
            .runner
            .execute(&self.program, &["list-lists".to_string()])
            .await?;
        if !output.success() {
            warn!(stderr = %output.stderr, "listing reminder lists failed");
            return Err(CommandError::Failed {
                program: self.program.clone(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(parse_lists(&output.stdout))
    }
}

pub fn parse_lists(stdout: &str) -> Vec<ReminderList> {
    stdout
        .lines()
        .filter_map(|line| LIST_LINE_REGEX.captures(line.trim()))
        .filter_map(|caps| {
            Some(ReminderList {
                name: caps.get(1)?.as_str().trim().to_string(),
                item_count: caps.get(2)?.as_str().parse().ok()?,
            })
        })
        .collect()
}
