//! Highlight control panel state.
//!
//! One toggle per catalog group plus the Ambiguous pseudo-group. Toggles only
//! change which highlight classes the display surface applies; the rendered
//! markup is never rebuilt.

use indexmap::IndexMap;
use serde::Serialize;

use conceptmark_common::{ConceptmarkError, Result};

use crate::groups::{SemanticGroup, SemanticGroupCatalog, AMBIGUOUS_ID};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupToggle {
    pub id: String,
    pub name: String,
    pub class: String,
    pub color: String,
    pub label: String,
    pub active: bool,
    pub disabled: bool,
}

impl GroupToggle {
    fn new(group: &SemanticGroup) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            class: group.class.clone(),
            color: group.color.clone(),
            label: group.label.clone(),
            active: true,
            disabled: true,
        }
    }

    fn is_ambiguous(&self) -> bool {
        self.id == AMBIGUOUS_ID
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightControls {
    toggles: Vec<GroupToggle>,
    disabled_all: bool,
}

impl HighlightControls {
    /// All toggles active and disabled until a result arrives.
    pub fn new(catalog: &SemanticGroupCatalog) -> Self {
        let toggles = catalog
            .groups()
            .iter()
            .chain(std::iter::once(catalog.ambiguous()))
            .map(GroupToggle::new)
            .collect();
        Self { toggles, disabled_all: false }
    }

    pub fn toggles(&self) -> &[GroupToggle] {
        &self.toggles
    }

    pub fn get(&self, id: &str) -> Option<&GroupToggle> {
        self.toggles.iter().find(|t| t.id == id)
    }

    pub fn disabled_all(&self) -> bool {
        self.disabled_all
    }

    /// Enable toggles for the groups present in a result; show the Ambiguous
    /// toggle only when the result has ambiguous mentions.
    pub fn update_visible(&mut self, group_counts: &IndexMap<String, usize>, has_ambiguous: bool) {
        for toggle in &mut self.toggles {
            toggle.disabled = if toggle.is_ambiguous() {
                !has_ambiguous
            } else {
                !group_counts.contains_key(&toggle.name)
            };
        }
        self.disabled_all = !group_counts.values().any(|&count| count > 0);
    }

    /// Enable every group toggle. The Ambiguous toggle keeps its state.
    pub fn enable_all(&mut self) {
        for toggle in self.toggles.iter_mut().filter(|t| !t.is_ambiguous()) {
            toggle.disabled = false;
        }
        self.disabled_all = false;
    }

    /// Disable every inactive toggle.
    pub fn disable_unselected(&mut self) {
        for toggle in self.toggles.iter_mut().filter(|t| !t.active) {
            toggle.disabled = true;
        }
    }

    /// Flip one toggle, returning its new state; `None` for unknown ids.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let toggle = self.toggles.iter_mut().find(|t| t.id == id)?;
        toggle.active = !toggle.active;
        Some(toggle.active)
    }

    pub fn show_all(&mut self) {
        self.set_all(true);
    }

    pub fn hide_all(&mut self) {
        self.set_all(false);
    }

    fn set_all(&mut self, active: bool) {
        for toggle in &mut self.toggles {
            toggle.active = active;
        }
    }

    /// Group ids to request from the annotation service.
    pub fn selected_groups(&self) -> Result<Vec<&str>> {
        let selected: Vec<&str> = self
            .toggles
            .iter()
            .filter(|t| t.active && !t.is_ambiguous())
            .map(|t| t.id.as_str())
            .collect();
        if selected.is_empty() {
            return Err(ConceptmarkError::NoGroupsSelected);
        }
        Ok(selected)
    }

    /// The All/None toolbar is worth showing when more than one toggle is usable.
    pub fn toolbar_visible(&self) -> bool {
        self.enabled().count() > 1
    }

    pub fn all_active(&self) -> bool {
        self.enabled().all(|t| t.active)
    }

    pub fn none_active(&self) -> bool {
        !self.enabled().any(|t| t.active)
    }

    /// `highlight-<class>` classes for the display surface, one per active enabled toggle.
    pub fn body_classes(&self) -> Vec<String> {
        self.enabled()
            .filter(|t| t.active)
            .map(|t| format!("highlight-{}", t.class))
            .collect()
    }

    fn enabled(&self) -> impl Iterator<Item = &GroupToggle> {
        self.toggles.iter().filter(|t| !t.disabled)
    }
}
