use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::normalize::CityAliases;
use crate::ConfigError;

/// A retail chain known to the system, e.g. `shufersal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Stable lowercase identifier used as the chain key in every response.
    pub name: String,
    /// Human-facing name, usually in Hebrew (e.g. `"שופרסל"`).
    pub display_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    pub chains: Vec<ChainConfig>,
    /// Extra spellings of a city mapped to the canonical city stored on branches.
    #[serde(default)]
    pub city_aliases: BTreeMap<String, String>,
}

impl CatalogFile {
    /// Built-in city aliases extended with the ones declared in this file.
    #[must_use]
    pub fn city_aliases(&self) -> CityAliases {
        let mut aliases = CityAliases::builtin();
        for (alias, canonical) in &self.city_aliases {
            aliases.insert(alias, canonical);
        }
        aliases
    }
}

/// Load and validate the chain catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: CatalogFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CatalogFileParse)?;

    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    if catalog.chains.is_empty() {
        return Err(ConfigError::Validation(
            "catalog must declare at least one chain".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();

    for chain in &catalog.chains {
        let name = chain.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "chain name must not be empty".to_string(),
            ));
        }

        if name != chain.name.to_lowercase() {
            return Err(ConfigError::Validation(format!(
                "chain name must be lowercase without surrounding spaces: '{}'",
                chain.name
            )));
        }

        if !seen_names.insert(name.to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate chain name: '{}'",
                chain.name
            )));
        }
    }

    for (alias, canonical) in &catalog.city_aliases {
        if alias.trim().is_empty() || canonical.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "city alias entries must be non-empty: '{alias}' -> '{canonical}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(name: &str) -> ChainConfig {
        ChainConfig {
            name: name.to_string(),
            display_name: None,
            notes: None,
        }
    }

    #[test]
    fn validate_accepts_valid_catalog() {
        let catalog = CatalogFile {
            chains: vec![chain("shufersal"), chain("victory")],
            city_aliases: BTreeMap::new(),
        };
        assert!(validate_catalog(&catalog).is_ok());
    }

    #[test]
    fn validate_rejects_empty_catalog() {
        let catalog = CatalogFile {
            chains: vec![],
            city_aliases: BTreeMap::new(),
        };
        let err = validate_catalog(&catalog).unwrap_err();
        assert!(err.to_string().contains("at least one chain"));
    }

    #[test]
    fn validate_rejects_duplicate_name() {
        let catalog = CatalogFile {
            chains: vec![chain("victory"), chain("victory")],
            city_aliases: BTreeMap::new(),
        };
        let err = validate_catalog(&catalog).unwrap_err();
        assert!(err.to_string().contains("duplicate chain name"));
    }

    #[test]
    fn validate_rejects_uppercase_name() {
        let catalog = CatalogFile {
            chains: vec![chain("Shufersal")],
            city_aliases: BTreeMap::new(),
        };
        assert!(validate_catalog(&catalog).is_err());
    }

    #[test]
    fn validate_rejects_blank_alias() {
        let mut city_aliases = BTreeMap::new();
        city_aliases.insert("  ".to_string(), "חיפה".to_string());
        let catalog = CatalogFile {
            chains: vec![chain("shufersal")],
            city_aliases,
        };
        assert!(validate_catalog(&catalog).is_err());
    }

    #[test]
    fn file_aliases_extend_builtin_aliases() {
        let mut city_aliases = BTreeMap::new();
        city_aliases.insert("Beer Sheva".to_string(), "באר שבע".to_string());
        let catalog = CatalogFile {
            chains: vec![chain("shufersal")],
            city_aliases,
        };
        let aliases = catalog.city_aliases();
        assert_eq!(aliases.resolve("beer sheva"), "באר שבע");
        assert_eq!(aliases.resolve("Tel Aviv"), "תל אביב");
    }

    #[test]
    fn load_catalog_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("catalog.yaml");
        assert!(path.exists(), "catalog.yaml missing at {path:?}");
        let catalog = load_catalog(&path).expect("failed to load catalog.yaml");
        let names: Vec<&str> = catalog.chains.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"shufersal"));
        assert!(names.contains(&"victory"));
    }

    #[test]
    fn load_catalog_reports_missing_file() {
        let err = load_catalog(Path::new("/nonexistent/catalog.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::CatalogFileIo { .. }));
    }
}
