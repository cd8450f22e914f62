use indexmap::IndexMap;

/// One dispatched run: module display name, the submitted values (keys
/// dropped, field order kept), and the wall-clock time of dispatch.
pub struct HistoryEntry {
    pub module_name: String,
    pub param_values: Vec<String>,
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn values_line(&self) -> String {
        self.param_values.join(" ")
    }
}

/// In-memory run history, newest entry first. Never trimmed, never
/// persisted.
#[derive(Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn record(&mut self, module_name: &str, inputs: &IndexMap<String, String>) {
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        self.record_at(module_name, inputs, timestamp);
    }

    fn record_at(&mut self, module_name: &str, inputs: &IndexMap<String, String>, timestamp: String) {
        self.entries.insert(
            0,
            HistoryEntry {
                module_name: module_name.to_string(),
                param_values: inputs.values().cloned().collect(),
                timestamp,
            },
        );
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn newest_entry_is_first() {
        let mut history = History::default();
        history.record_at("Scanner", &inputs(&[("target", "10.0.0.1")]), "10:00:00".into());
        history.record_at("Prober", &inputs(&[]), "10:00:05".into());
        history.record_at("Scanner", &inputs(&[("target", "10.0.0.2")]), "10:00:09".into());

        let names: Vec<&str> = history
            .entries()
            .iter()
            .map(|entry| entry.module_name.as_str())
            .collect();
        assert_eq!(names, ["Scanner", "Prober", "Scanner"]);
        assert_eq!(history.entries()[0].values_line(), "10.0.0.2");
        assert_eq!(history.entries()[2].values_line(), "10.0.0.1");
    }

    #[test]
    fn values_keep_submission_order_and_drop_keys() {
        let mut history = History::default();
        history.record_at(
            "Prober",
            &inputs(&[("host", "example.org"), ("port", "443")]),
            "10:00:00".into(),
        );
        assert_eq!(history.entries()[0].values_line(), "example.org 443");
    }

    #[test]
    fn empty_inputs_render_as_empty_line() {
        let mut history = History::default();
        history.record_at("Bare", &inputs(&[]), "10:00:00".into());
        assert_eq!(history.entries()[0].values_line(), "");
    }
}
