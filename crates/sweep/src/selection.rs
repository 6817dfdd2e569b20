//! Reads which explorer tree item is selected

use serde_json::Value;
use tracing::debug;

use storysweep_common::{Error, Result, TreeSelectionPosition};

use crate::config::Selectors;
use crate::session::BrowserSession;

/// Reads the selected node's offset and name from the explorer DOM
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    position_expr: String,
    name_expr: String,
}

impl SelectionTracker {
    pub fn new(selectors: &Selectors) -> Self {
        Self {
            position_expr: property_expr(&selectors.selected_tree_item, "offsetTop"),
            name_expr: property_expr(&selectors.selected_menu_item, "id"),
        }
    }

    /// Expression evaluated to read the selected offset
    pub fn position_expression(&self) -> &str {
        &self.position_expr
    }

    /// Expression evaluated to read the selected entry id
    pub fn name_expression(&self) -> &str {
        &self.name_expr
    }

    /// Offset of the selected tree item, or None while nothing is selected.
    pub async fn current_position<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<Option<TreeSelectionPosition>> {
        let value = session.evaluate(&self.position_expr).await?;
        let position = match value {
            Value::Null => None,
            Value::Number(n) => n.as_f64().map(TreeSelectionPosition),
            other => {
                return Err(Error::Browser(format!(
                    "selected offset is not a number: {}",
                    other
                )))
            }
        };

        debug!(
            "selected offset: {}",
            position.map(|p| p.to_string()).unwrap_or_else(|| "none".into())
        );
        Ok(position)
    }

    /// Like [`current_position`](Self::current_position) but a missing
    /// selection is fatal.
    pub async fn require_position<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<TreeSelectionPosition> {
        self.current_position(session)
            .await?
            .ok_or(Error::SelectionLost)
    }

    /// DOM id of the selected menu item
    pub async fn current_entry_name<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<String> {
        match session.evaluate(&self.name_expr).await? {
            Value::String(name) if !name.is_empty() => Ok(name),
            _ => Err(Error::SelectionLost),
        }
    }
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new(&Selectors::default())
    }
}

/// `document.querySelector(<sel>)?.<prop> ?? null`, so "nothing selected"
/// comes back as JSON null rather than undefined.
fn property_expr(selector: &str, property: &str) -> String {
    let literal = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!("document.querySelector({})?.{} ?? null", literal, property)
}
