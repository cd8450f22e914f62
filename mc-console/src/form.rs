use api::{ParamKind, ParamSpec};
use indexmap::IndexMap;

/// One generated input field.
pub struct FormField {
    pub label: String,
    pub name: String,
    pub kind: ParamKind,
    pub placeholder: String,
    pub value: String,
}

impl FormField {
    /// Entry-time gate for numeric fields; text fields accept anything.
    /// A blank entry is always allowed, it just gets omitted later.
    pub fn accepts(&self, raw: &str) -> bool {
        match self.kind {
            ParamKind::Number => {
                let trimmed = raw.trim();
                trimmed.is_empty() || trimmed.parse::<f64>().is_ok()
            }
            ParamKind::Text => true,
        }
    }
}

/// The dynamically generated parameter form for the selected module.
#[derive(Default)]
pub struct ParamForm {
    fields: Vec<FormField>,
}

impl ParamForm {
    /// Discards every existing field and regenerates the set from the
    /// given parameter metadata, in order.
    pub fn rebuild(&mut self, params: &[ParamSpec]) {
        self.fields = params
            .iter()
            .map(|param| FormField {
                label: format!("--{}", param.name),
                name: param.name.clone(),
                kind: param.kind,
                placeholder: param.description.clone().unwrap_or_default(),
                value: String::new(),
            })
            .collect();
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [FormField] {
        &mut self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Values keyed by field name, in field order. Fields whose trimmed
    /// value is empty are omitted entirely, not sent as empty strings.
    pub fn collect(&self) -> IndexMap<String, String> {
        self.fields
            .iter()
            .filter(|field| !field.value.trim().is_empty())
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, kind: ParamKind, description: Option<&str>) -> ParamSpec {
        ParamSpec {
            name: name.to_string(),
            kind,
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn rebuild_generates_one_field_per_param_in_order() {
        let mut form = ParamForm::default();
        form.rebuild(&[
            param("target", ParamKind::Text, Some("host to scan")),
            param("port", ParamKind::Number, None),
        ]);

        assert_eq!(form.fields().len(), 2);
        assert_eq!(form.fields()[0].label, "--target");
        assert_eq!(form.fields()[0].placeholder, "host to scan");
        assert_eq!(form.fields()[1].label, "--port");
        assert_eq!(form.fields()[1].placeholder, "");
        assert!(form.fields()[1].kind.is_numeric());
    }

    #[test]
    fn rebuild_discards_previous_fields() {
        let mut form = ParamForm::default();
        form.rebuild(&[param("target", ParamKind::Text, None)]);
        form.fields_mut()[0].value = "10.0.0.1".to_string();

        form.rebuild(&[param("host", ParamKind::Text, None)]);
        assert_eq!(form.fields().len(), 1);
        assert_eq!(form.fields()[0].name, "host");
        assert!(form.fields()[0].value.is_empty());
    }

    #[test]
    fn collect_omits_blank_and_whitespace_fields() {
        let mut form = ParamForm::default();
        form.rebuild(&[
            param("target", ParamKind::Text, None),
            param("port", ParamKind::Number, None),
            param("note", ParamKind::Text, None),
        ]);
        form.fields_mut()[0].value = "10.0.0.1".to_string();
        form.fields_mut()[1].value = "   ".to_string();

        let inputs = form.collect();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs.get("target").map(String::as_str), Some("10.0.0.1"));
        assert!(!inputs.contains_key("port"));
        assert!(!inputs.contains_key("note"));
    }

    #[test]
    fn collect_preserves_field_order() {
        let mut form = ParamForm::default();
        form.rebuild(&[
            param("zeta", ParamKind::Text, None),
            param("alpha", ParamKind::Text, None),
        ]);
        form.fields_mut()[0].value = "1".to_string();
        form.fields_mut()[1].value = "2".to_string();

        let inputs = form.collect();
        let keys: Vec<&str> = inputs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn numeric_fields_reject_non_numbers_at_entry() {
        let mut form = ParamForm::default();
        form.rebuild(&[param("port", ParamKind::Number, None)]);
        let field = &form.fields()[0];
        assert!(field.accepts("8080"));
        assert!(field.accepts("3.14"));
        assert!(field.accepts(""));
        assert!(!field.accepts("eighty"));
    }
}
