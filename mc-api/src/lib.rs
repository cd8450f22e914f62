//! Wire types shared between the console and the backend.

pub use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field kind for a module parameter. The backend only distinguishes
/// numeric fields; every other declared type collapses to free text.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Number,
    #[default]
    #[serde(other)]
    Text,
}

impl ParamKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ParamKind::Number)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ParamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleSpec {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub inputs: Vec<ParamSpec>,
}

/// Run submission. Only fields the operator actually filled appear in
/// `inputs`; a blank field is indistinguishable from one never shown.
/// The map keeps insertion order so history can show values as entered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRequest {
    pub path: String,
    pub inputs: IndexMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResponse {
    pub exec_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutputSnapshot {
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub done: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_param_type_collapses_to_text() {
        let spec: ParamSpec =
            serde_json::from_str(r#"{"name":"target","type":"ipv4"}"#).expect("spec should parse");
        assert_eq!(spec.kind, ParamKind::Text);
        assert!(!spec.kind.is_numeric());

        let spec: ParamSpec =
            serde_json::from_str(r#"{"name":"count","type":"number"}"#).expect("spec should parse");
        assert_eq!(spec.kind, ParamKind::Number);
    }

    #[test]
    fn param_type_defaults_to_text_when_absent() {
        let spec: ParamSpec =
            serde_json::from_str(r#"{"name":"target"}"#).expect("spec should parse");
        assert_eq!(spec.kind, ParamKind::Text);
        assert!(spec.description.is_none());
    }

    #[test]
    fn module_without_inputs_gets_empty_sequence() {
        let module: ModuleSpec =
            serde_json::from_str(r#"{"name":"Scanner","path":"mod/a"}"#)
                .expect("module should parse");
        assert!(module.inputs.is_empty());
        assert!(module.id.is_empty());
    }

    #[test]
    fn run_request_serializes_inputs_in_insertion_order() {
        let mut inputs = IndexMap::new();
        inputs.insert("zeta".to_string(), "1".to_string());
        inputs.insert("alpha".to_string(), "2".to_string());
        let request = RunRequest {
            path: "mod/a".to_string(),
            inputs,
        };
        let json = serde_json::to_string(&request).expect("request should serialize");
        assert_eq!(json, r#"{"path":"mod/a","inputs":{"zeta":"1","alpha":"2"}}"#);
    }
}
