//! Loading and saving the form configuration through an option store.
//!
//! ## Stored layout
//!
//! ```json
//! { "initialized": true, "formElements": [ { "type": "field", ... }, ... ] }
//! ```
//!
//! The layout carries no version marker. Loading reconciles the stored
//! elements with the current catalog: an empty store is bootstrapped with one
//! field per column, and columns that appeared since the last save are
//! prepended as default fields.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::{
    element::{FormConfig, FormElement},
    options::OptionStore,
};

pub const FORM_ELEMENTS_KEY: &str = "formElements";
pub const INITIALIZED_KEY: &str = "initialized";

/// How a loaded configuration came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Bootstrapped,
    Migrated { added: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: FormConfig,
    pub outcome: LoadOutcome,
    /// Stored state existed but could not be decoded.
    pub recovered: bool,
}

pub fn to_options_value(config: &FormConfig) -> Result<Value> {
    let elements = serde_json::to_value(config).context("Serializing form elements")?;
    let mut options = Map::new();
    options.insert(INITIALIZED_KEY.to_string(), Value::Bool(true));
    options.insert(FORM_ELEMENTS_KEY.to_string(), elements);
    Ok(Value::Object(options))
}

pub fn save(store: &dyn OptionStore, config: &FormConfig) -> Result<()> {
    let value = to_options_value(config)?;
    store
        .set_options(&value)
        .context("Writing form configuration to option store")?;
    debug!("Saved form configuration with {} element(s)", config.len());
    Ok(())
}

fn is_first_install(options: Option<&Value>) -> bool {
    let Some(options) = options else {
        return true;
    };
    match options {
        Value::Null => true,
        Value::Object(map) => {
            map.get(INITIALIZED_KEY).and_then(Value::as_bool) != Some(true)
                && !map.contains_key(FORM_ELEMENTS_KEY)
        }
        _ => false,
    }
}

/// Decodes the stored element list, skipping elements that do not decode.
/// `None` when the state as a whole is malformed.
pub fn decode_elements(options: &Value) -> Option<FormConfig> {
    let items = match options.get(FORM_ELEMENTS_KEY)? {
        Value::Null => return Some(FormConfig::default()),
        Value::Array(items) => items,
        other => {
            warn!("Stored form elements are not a list ({other}); starting from an empty list");
            return None;
        }
    };
    let elements = items
        .iter()
        .enumerate()
        .filter_map(
            |(position, item)| match serde_json::from_value::<FormElement>(item.clone()) {
                Ok(element) => Some(element),
                Err(err) => {
                    warn!("Skipping stored form element {position}: {err}");
                    None
                }
            },
        )
        .collect::<Vec<_>>();
    Some(FormConfig::new(elements))
}

/// Prepends default fields for catalog columns that have none, in catalog
/// order. Returns the columns added.
pub fn reconcile(config: &mut FormConfig, catalog_columns: &[String]) -> Vec<String> {
    let missing = config.available_columns(catalog_columns);
    if !missing.is_empty() {
        config.prepend(missing.iter().map(FormElement::field).collect());
    }
    missing
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoredOptions {
    Present(Option<Value>),
    /// The store holds text that is not JSON.
    Unparseable,
}

pub fn read_stored(store: &dyn OptionStore) -> Result<StoredOptions> {
    match store.get_options() {
        Ok(options) => Ok(StoredOptions::Present(options)),
        Err(err) if err.downcast_ref::<serde_json::Error>().is_some() => {
            warn!("Stored form configuration is not valid JSON; starting from an empty list: {err:#}");
            Ok(StoredOptions::Unparseable)
        }
        Err(err) => Err(err.context("Reading form configuration from option store")),
    }
}

/// Loads the configuration, bootstrapping or migrating it against the
/// catalog and persisting whenever it had to change.
pub fn load(store: &dyn OptionStore, catalog_columns: &[String]) -> Result<LoadedConfig> {
    let stored = read_stored(store)?;
    resolve(store, stored, catalog_columns)
}

pub fn resolve(
    store: &dyn OptionStore,
    stored: StoredOptions,
    catalog_columns: &[String],
) -> Result<LoadedConfig> {
    let options = match stored {
        StoredOptions::Present(options) => options,
        StoredOptions::Unparseable => return settle(store, None, catalog_columns),
    };

    if is_first_install(options.as_ref()) {
        let config = FormConfig::bootstrap(catalog_columns);
        if catalog_columns.is_empty() {
            warn!("Column catalog is empty; nothing to bootstrap");
        } else {
            info!(
                "First install: generated {} field(s) from the column catalog",
                config.len()
            );
            save(store, &config)?;
        }
        return Ok(LoadedConfig {
            config,
            outcome: LoadOutcome::Bootstrapped,
            recovered: false,
        });
    }

    let decoded = options.as_ref().and_then(decode_elements);
    settle(store, decoded, catalog_columns)
}

fn settle(
    store: &dyn OptionStore,
    decoded: Option<FormConfig>,
    catalog_columns: &[String],
) -> Result<LoadedConfig> {
    let recovered = decoded.is_none();
    let mut config = decoded.unwrap_or_default();

    let added = reconcile(&mut config, catalog_columns);
    if added.is_empty() {
        debug!("Loaded form configuration with {} element(s)", config.len());
        return Ok(LoadedConfig {
            config,
            outcome: LoadOutcome::Loaded,
            recovered,
        });
    }

    info!(
        "Added {} field(s) for new column(s): {}",
        added.len(),
        added.join(", ")
    );
    save(store, &config)?;
    Ok(LoadedConfig {
        config,
        outcome: LoadOutcome::Migrated { added },
        recovered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MemoryOptionStore;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn first_install_detection_follows_stored_shape() {
        assert!(is_first_install(None));
        assert!(is_first_install(Some(&json!({}))));
        assert!(is_first_install(Some(&json!(null))));
        assert!(!is_first_install(Some(&json!({"initialized": true}))));
        assert!(!is_first_install(Some(&json!({"formElements": []}))));
    }

    #[test]
    fn empty_catalog_bootstrap_is_not_persisted() {
        let store = MemoryOptionStore::new();
        let loaded = load(&store, &[]).expect("load");
        assert!(loaded.config.is_empty());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn malformed_elements_recover_as_empty_then_migrate() {
        let store = MemoryOptionStore::with_value(json!({
            "initialized": true,
            "formElements": {"type": "image"}
        }));
        let loaded = load(&store, &columns(&["A"])).expect("load");
        assert!(loaded.recovered);
        assert_eq!(loaded.config.elements(), &[FormElement::field("A")]);
    }

    #[test]
    fn undecodable_elements_are_skipped_individually() {
        let options = json!({
            "initialized": true,
            "formElements": [
                {"type": "title", "content": "Intro"},
                {"type": "image", "src": "logo.png"},
                {"type": "separator"}
            ]
        });
        let config = decode_elements(&options).expect("list decodes");
        assert_eq!(
            config.elements(),
            &[FormElement::title("Intro"), FormElement::separator()]
        );
    }

    #[test]
    fn unchanged_configuration_is_not_rewritten() {
        let store = MemoryOptionStore::new();
        save(&store, &FormConfig::bootstrap(&columns(&["A", "B"]))).unwrap();
        let loaded = load(&store, &columns(&["A", "B"])).expect("load");
        assert_eq!(loaded.outcome, LoadOutcome::Loaded);
        assert_eq!(store.writes(), 1);
    }
}
