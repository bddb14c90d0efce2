use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::config::{load_document, Result};

/// The application configuration of an application instance.
///
/// Options are grouped per component, the application master reads its own settings from
/// [`crate::config::COMPONENT_AM`]. Global options are kept for completeness but are not
/// consulted when looking up component options.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub global: BTreeMap<String, String>,

    #[serde(default)]
    pub components: BTreeMap<String, BTreeMap<String, String>>,
}

impl InstanceDefinition {
    pub fn from_file(path: &Path) -> Result<Self> {
        load_document(path)
    }

    pub fn component<'a>(&'a self, name: &'a str) -> ComponentOptions<'a> {
        ComponentOptions {
            name,
            options: self.components.get(name),
        }
    }

    pub fn set_component_option(
        &mut self,
        component: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.components
            .entry(component.into())
            .or_default()
            .insert(key.into(), value.into());
    }
}

/// Read-only view on the options of a single component.
#[derive(Clone, Copy, Debug)]
pub struct ComponentOptions<'a> {
    name: &'a str,
    options: Option<&'a BTreeMap<String, String>>,
}

impl<'a> ComponentOptions<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the value of `key`, treating empty values the same as missing ones.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.options
            .and_then(|options| options.get(key))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use indoc::indoc;

    use super::*;
    use crate::config::{COMPONENT_AM, KEY_AM_KEYTAB_LOCAL_PATH, KEY_KEYTAB_PRINCIPAL};

    #[test]
    fn test_component_options() {
        let input = indoc! {"
            schema: http://example.org/specification/v2.0.0
            global:
              slider.keytab.principal.name: global@EXAMPLE.COM
            components:
              slider-appmaster:
                slider.keytab.principal.name: am/host@EXAMPLE.COM
                slider.am.keytab.local.path: ''
        "};
        let instance: InstanceDefinition = serde_yaml::from_str(input).expect("illegal test input");
        let am = instance.component(COMPONENT_AM);

        assert_eq!(am.name(), COMPONENT_AM);
        assert_eq!(am.get(KEY_KEYTAB_PRINCIPAL), Some("am/host@EXAMPLE.COM"));
        assert_eq!(am.get(KEY_AM_KEYTAB_LOCAL_PATH), None);
        assert!(!am.is_set(KEY_AM_KEYTAB_LOCAL_PATH));
    }

    #[test]
    fn test_missing_component_has_no_options() {
        let instance = InstanceDefinition::default();
        let am = instance.component(COMPONENT_AM);
        assert_eq!(am.get(KEY_KEYTAB_PRINCIPAL), None);
    }

    #[test]
    fn test_global_options_are_not_inherited() {
        let mut instance = InstanceDefinition::default();
        instance
            .global
            .insert(KEY_KEYTAB_PRINCIPAL.to_string(), "global".to_string());
        assert!(!instance.component(COMPONENT_AM).is_set(KEY_KEYTAB_PRINCIPAL));
    }

    #[test]
    fn test_load_app_config_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(
            br#"{
              "schema": "http://example.org/specification/v2.0.0",
              "metadata": {},
              "global": {},
              "components": {
                "slider-appmaster": {
                  "slider.am.login.keytab.name": "app.keytab"
                }
              }
            }"#,
        )
        .unwrap();

        let instance = InstanceDefinition::from_file(file.path()).unwrap();
        assert_eq!(
            instance
                .component(COMPONENT_AM)
                .get(crate::config::KEY_AM_LOGIN_KEYTAB_NAME),
            Some("app.keytab")
        );
    }
}
