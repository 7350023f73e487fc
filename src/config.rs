use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dictionary::DEFAULT_DICTIONARY_URL;
use crate::engine::progress_store::SeedTable;
use crate::engine::record::{ItemId, ItemStatus};
use crate::engine::report::CategorySpec;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_items_per_category")]
    pub items_per_category: u32,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_pass_percentage")]
    pub pass_percentage: u32,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_dictionary_url")]
    pub dictionary_url: String,
    /// Category -> item id -> status written on the category's first load.
    #[serde(default = "default_seeds")]
    pub seeds: BTreeMap<String, BTreeMap<String, ItemStatus>>,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lingo")
        .join("progress")
        .to_string_lossy()
        .to_string()
}
fn default_items_per_category() -> u32 {
    5
}
fn default_categories() -> Vec<String> {
    ('A'..='Z').map(|c| c.to_string()).collect()
}
fn default_pass_percentage() -> u32 {
    100
}
fn default_log_filter() -> String {
    "warn".to_string()
}
fn default_dictionary_url() -> String {
    DEFAULT_DICTIONARY_URL.to_string()
}
fn default_seeds() -> BTreeMap<String, BTreeMap<String, ItemStatus>> {
    let letter_a = BTreeMap::from([
        ("1".to_string(), ItemStatus::Completed),
        ("2".to_string(), ItemStatus::Completed),
        ("3".to_string(), ItemStatus::Wrong),
        ("4".to_string(), ItemStatus::Skipped),
        ("5".to_string(), ItemStatus::Completed),
    ]);
    BTreeMap::from([("A".to_string(), letter_a)])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            items_per_category: default_items_per_category(),
            categories: default_categories(),
            pass_percentage: default_pass_percentage(),
            log_filter: default_log_filter(),
            dictionary_url: default_dictionary_url(),
            seeds: default_seeds(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let mut config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lingo")
            .join("config.toml")
    }

    /// Clamp out-of-range values and drop empty or repeated categories.
    pub fn validate(&mut self) {
        self.items_per_category = self.items_per_category.max(1);
        self.pass_percentage = self.pass_percentage.min(100);

        let mut seen = Vec::with_capacity(self.categories.len());
        for category in self.categories.drain(..) {
            let category = category.trim().to_string();
            if !category.is_empty() && !seen.contains(&category) {
                seen.push(category);
            }
        }
        self.categories = seen;
    }

    pub fn category_specs(&self) -> Vec<CategorySpec> {
        self.categories
            .iter()
            .map(|id| CategorySpec::new(id.clone(), self.items_per_category))
            .collect()
    }

    /// Item ids in `seeds` are TOML keys, so they arrive as strings.
    pub fn seed_table(&self) -> Result<SeedTable> {
        let mut table = SeedTable::new();
        for (category, items) in &self.seeds {
            let mut parsed: Vec<(ItemId, ItemStatus)> = Vec::with_capacity(items.len());
            for (id, status) in items {
                let id: ItemId = id
                    .parse()
                    .ok()
                    .filter(|id| *id > 0)
                    .with_context(|| format!("seed for `{category}`: `{id}` is not a positive item id"))?;
                parsed.push((id, *status));
            }
            table.insert(category, parsed);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.items_per_category, 5);
        assert_eq!(config.categories.len(), 26);
        assert_eq!(config.pass_percentage, 100);
        assert!(config.data_dir.contains("lingo"));
        assert_eq!(config.seeds["A"]["3"], ItemStatus::Wrong);
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
items_per_category = 8
categories = ["Pronouns", "Prepositions"]

[seeds.Pronouns]
1 = "completed"
2 = "skipped"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.items_per_category, 8);
        assert_eq!(config.categories, ["Pronouns", "Prepositions"]);
        assert_eq!(config.log_filter, "warn");
        assert!(!config.seeds.contains_key("A"), "explicit seeds replace the default table");

        let seeds = config.seed_table().unwrap();
        let record = seeds.record_for("Pronouns").unwrap();
        assert_eq!(record.status(2), ItemStatus::Skipped);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.categories, deserialized.categories);
        assert_eq!(config.seeds, deserialized.seeds);
        assert_eq!(config.dictionary_url, deserialized.dictionary_url);
    }

    #[test]
    fn test_validate_clamps_and_dedupes() {
        let mut config = Config::default();
        config.items_per_category = 0;
        config.pass_percentage = 250;
        config.categories = vec!["A".into(), " ".into(), "B".into(), "A".into(), " C ".into()];
        config.validate();
        assert_eq!(config.items_per_category, 1);
        assert_eq!(config.pass_percentage, 100);
        assert_eq!(config.categories, ["A", "B", "C"]);
    }

    #[test]
    fn test_seed_table_rejects_bad_ids() {
        let mut config = Config::default();
        config
            .seeds
            .insert("B".to_string(), BTreeMap::from([("zero".to_string(), ItemStatus::Wrong)]));
        assert!(config.seed_table().is_err());

        config.seeds.insert("B".to_string(), BTreeMap::from([("0".to_string(), ItemStatus::Wrong)]));
        assert!(config.seed_table().is_err());
    }

    #[test]
    fn test_default_seed_table_and_specs() {
        let config = Config::default();
        let seeds = config.seed_table().unwrap();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds.record_for("A").unwrap().items().len(), 5);

        let specs = config.category_specs();
        assert_eq!(specs.first(), Some(&CategorySpec::new("A", 5)));
        assert_eq!(specs.len(), 26);
    }
}
