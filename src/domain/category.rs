//! Domain types representing spending categories.

use serde::{Deserialize, Serialize};

use crate::domain::common::*;

/// Label shown for expenses whose category no longer exists.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// A user-defined spending bucket. `color` and `icon` are display hints only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
        }
    }
}

impl Identifiable for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        if self.icon.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.icon, self.name)
        }
    }
}

/// The ten categories seeded on first run.
pub fn default_categories() -> Vec<Category> {
    [
        ("1", "Food & Dining", "#ef4444", "🍽️"),
        ("2", "Transportation", "#3b82f6", "🚗"),
        ("3", "Entertainment", "#8b5cf6", "🎬"),
        ("4", "Shopping", "#f59e0b", "🛍️"),
        ("5", "Health & Fitness", "#10b981", "💪"),
        ("6", "Bills & Utilities", "#6b7280", "⚡"),
        ("7", "Travel", "#06b6d4", "✈️"),
        ("8", "Education", "#84cc16", "📚"),
        ("9", "Investment", "#f97316", "📈"),
        ("10", "Others", "#64748b", "🏷️"),
    ]
    .into_iter()
    .map(|(id, name, color, icon)| Category::new(id, name, color, icon))
    .collect()
}
