//! Selection state behind the multi-select filter dropdown

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        SelectOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Selected values plus the open/closed state of the panel.
///
/// The first non-empty option list selects everything if nothing is selected
/// yet. That happens once per widget: a user who clears the selection keeps
/// an empty selection across later option updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    selected: Vec<String>,
    auto_select_done: bool,
    open: bool,
}

impl Selection {
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns true when the selection changed
    pub fn sync_options(&mut self, options: &[SelectOption]) -> bool {
        if self.auto_select_done || options.is_empty() {
            return false;
        }
        self.auto_select_done = true;
        if !self.selected.is_empty() {
            return false;
        }
        self.selected = options.iter().map(|o| o.value.clone()).collect();
        true
    }

    pub fn is_all_selected(&self, options: &[SelectOption]) -> bool {
        !options.is_empty()
            && options.len() == self.selected.len()
            && options.iter().all(|o| self.selected.contains(&o.value))
    }

    pub fn toggle_all(&mut self, options: &[SelectOption]) {
        if self.is_all_selected(options) {
            self.selected.clear();
        } else {
            self.selected = options.iter().map(|o| o.value.clone()).collect();
        }
    }

    /// Flips one option. Reaching the full set stores it in option order.
    pub fn toggle(&mut self, value: &str, options: &[SelectOption]) {
        if let Some(pos) = self.selected.iter().position(|v| v == value) {
            self.selected.remove(pos);
        } else {
            self.selected.push(value.to_string());
        }

        let covers_all = options
            .iter()
            .all(|o| self.selected.iter().any(|v| *v == o.value));
        if covers_all && !options.is_empty() {
            self.selected = options.iter().map(|o| o.value.clone()).collect();
        }
    }

    /// Label of the closed button
    pub fn summary(&self, options: &[SelectOption], all_label: &str) -> String {
        if self.selected.is_empty() || self.is_all_selected(options) {
            return all_label.to_string();
        }
        if self.selected.len() == 1 {
            return options
                .iter()
                .find(|o| o.value == self.selected[0])
                .map(|o| o.label.clone())
                .unwrap_or_else(|| all_label.to_string());
        }
        format!("{} selected", self.selected.len())
    }

    pub fn toggle_open(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn on_key(&mut self, key: &str) {
        if key == "Escape" {
            self.close();
        }
    }
}
