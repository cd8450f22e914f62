use std::collections::HashMap;

use api::{ModuleSpec, ParamSpec};

use crate::client::ApiClient;

/// The loaded module catalog plus the current selection.
///
/// Parameter metadata is held in a direct map keyed by module path, so
/// the selection control never has to carry serialized metadata.
pub struct Catalog {
    modules: Vec<ModuleSpec>,
    params_by_path: HashMap<String, Vec<ParamSpec>>,
    selected: usize,
}

impl Catalog {
    pub fn from_modules(modules: Vec<ModuleSpec>) -> Self {
        let params_by_path = modules
            .iter()
            .map(|module| (module.path.clone(), module.inputs.clone()))
            .collect();
        Self {
            modules,
            params_by_path,
            selected: 0,
        }
    }

    pub async fn load(client: &ApiClient) -> Result<Self, reqwest::Error> {
        Ok(Self::from_modules(client.fetch_modules().await?))
    }

    pub fn modules(&self) -> &[ModuleSpec] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Moves the selection; out-of-range indexes leave it untouched.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.modules.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    pub fn selected_module(&self) -> Option<&ModuleSpec> {
        self.modules.get(self.selected)
    }

    /// Parameter metadata for the selected module, or an empty
    /// sequence when nothing is selected or the map has no entry.
    pub fn selected_params(&self) -> &[ParamSpec] {
        self.selected_module()
            .and_then(|module| self.params_by_path.get(&module.path))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use api::ParamKind;

    use super::*;

    fn module(path: &str, name: &str, inputs: Vec<ParamSpec>) -> ModuleSpec {
        ModuleSpec {
            id: String::new(),
            name: name.to_string(),
            path: path.to_string(),
            inputs,
        }
    }

    fn param(name: &str) -> ParamSpec {
        ParamSpec {
            name: name.to_string(),
            kind: ParamKind::Text,
            description: None,
        }
    }

    #[test]
    fn catalog_maps_every_module_to_its_params() {
        let catalog = Catalog::from_modules(vec![
            module("mod/a", "Scanner", vec![param("target")]),
            module("mod/b", "Prober", vec![param("host"), param("port")]),
            module("mod/c", "Bare", vec![]),
        ]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.params_by_path.len(), 3);
        assert_eq!(catalog.params_by_path["mod/b"].len(), 2);
        assert!(catalog.params_by_path["mod/c"].is_empty());
    }

    #[test]
    fn first_module_is_selected_by_default() {
        let catalog = Catalog::from_modules(vec![
            module("mod/a", "Scanner", vec![param("target")]),
            module("mod/b", "Prober", vec![]),
        ]);
        assert_eq!(catalog.selected_index(), 0);
        assert_eq!(catalog.selected_module().map(|m| m.name.as_str()), Some("Scanner"));
        assert_eq!(catalog.selected_params().len(), 1);
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let mut catalog = Catalog::from_modules(vec![module("mod/a", "Scanner", vec![])]);
        assert!(!catalog.select(1));
        assert_eq!(catalog.selected_index(), 0);
        assert!(catalog.select(0));
    }

    #[test]
    fn empty_catalog_has_no_selection_and_no_params() {
        let catalog = Catalog::from_modules(Vec::new());
        assert!(catalog.is_empty());
        assert!(catalog.selected_module().is_none());
        assert!(catalog.selected_params().is_empty());
    }
}
