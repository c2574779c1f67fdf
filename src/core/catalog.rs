//! Asset category tables, grouped by depreciation regime.

use super::error::{CalcError, CalcResult};
use super::validate::HUNDRED;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock};

/// Regimes every catalog must provide.
pub const REQUIRED_REGIMES: &[&str] = &["general", "simplified"];

/// Maximum depreciation rate and period for one kind of asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetCategory {
    pub id: String,
    pub family: String,
    pub name: String,
    /// Maximum yearly rate, percent of the depreciable base
    #[schemars(with = "f64")]
    pub max_rate_percent: Decimal,
    /// Maximum number of years the base may be spread over
    pub max_period_years: u32,
    /// Whether free-allocation or accelerated incentives may apply
    pub allows_incentive: bool,
}

impl AssetCategory {
    fn validate(&self, regime: &str) -> CalcResult<()> {
        let at = |field: &str| format!("{regime}/{}: {field}", self.id);
        if self.id.trim().is_empty() {
            return Err(CalcError::configuration(format!(
                "{regime}: category id must not be empty"
            )));
        }
        if self.family.trim().is_empty() {
            return Err(CalcError::configuration(at("family must not be empty")));
        }
        if self.name.trim().is_empty() {
            return Err(CalcError::configuration(at("name must not be empty")));
        }
        if self.max_rate_percent <= Decimal::ZERO || self.max_rate_percent > HUNDRED {
            return Err(CalcError::configuration(at(&format!(
                "maxRatePercent {} outside (0, 100]",
                self.max_rate_percent
            ))));
        }
        if self.max_period_years == 0 {
            return Err(CalcError::configuration(at("maxPeriodYears must be at least 1")));
        }
        Ok(())
    }
}

/// Category tables keyed by regime name. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CatalogTables {
    regimes: BTreeMap<String, Vec<AssetCategory>>,
}

impl CatalogTables {
    /// Build and validate a complete set of tables.
    pub fn new(regimes: BTreeMap<String, Vec<AssetCategory>>) -> CalcResult<Self> {
        let tables = CatalogTables { regimes };
        tables.validate()?;
        Ok(tables)
    }

    /// Read a catalog import document: `{ "<regime>": [ {category}, .. ] }`.
    pub fn from_json<R: Read>(reader: R) -> anyhow::Result<Self> {
        let regimes: BTreeMap<String, Vec<AssetCategory>> = serde_json::from_reader(reader)?;
        Ok(CatalogTables::new(regimes)?)
    }

    pub fn validate(&self) -> CalcResult<()> {
        for regime in REQUIRED_REGIMES {
            match self.regimes.get(*regime) {
                None => {
                    return Err(CalcError::configuration(format!(
                        "missing regime '{regime}'"
                    )))
                }
                Some(categories) if categories.is_empty() => {
                    return Err(CalcError::configuration(format!(
                        "regime '{regime}' has no categories"
                    )))
                }
                Some(_) => {}
            }
        }

        for (regime, categories) in &self.regimes {
            let mut seen = HashSet::new();
            for category in categories {
                category.validate(regime)?;
                if !seen.insert(category.id.as_str()) {
                    return Err(CalcError::configuration(format!(
                        "{regime}: duplicate category id '{}'",
                        category.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, regime: &str, category_id: &str) -> CalcResult<&AssetCategory> {
        self.regimes
            .get(regime)
            .and_then(|categories| categories.iter().find(|c| c.id == category_id))
            .ok_or_else(|| CalcError::NotFound {
                regime: regime.to_string(),
                category: category_id.to_string(),
            })
    }

    pub fn regimes(&self) -> impl Iterator<Item = (&str, &[AssetCategory])> {
        self.regimes
            .iter()
            .map(|(name, categories)| (name.as_str(), categories.as_slice()))
    }

    pub fn categories(&self, regime: &str) -> Option<&[AssetCategory]> {
        self.regimes.get(regime).map(Vec::as_slice)
    }

    /// Tables shipped with the tool.
    pub fn builtin() -> Self {
        let general = vec![
            category(
                "industrial-buildings",
                "buildings",
                "Industrial buildings",
                dec!(3),
                68,
                false,
            ),
            category(
                "commercial-buildings",
                "buildings",
                "Commercial and office buildings",
                dec!(2),
                100,
                false,
            ),
            category(
                "warehouses",
                "buildings",
                "Warehouses and storage",
                dec!(7),
                30,
                false,
            ),
            category(
                "installations",
                "installations",
                "Technical installations",
                dec!(10),
                20,
                false,
            ),
            category(
                "renewable-installations",
                "installations",
                "Renewable energy installations",
                dec!(7),
                30,
                true,
            ),
            category("machinery", "machinery", "Machinery", dec!(12), 18, true),
            category(
                "furniture",
                "furniture",
                "Furniture and fittings",
                dec!(10),
                20,
                false,
            ),
            category(
                "passenger-vehicles",
                "transport",
                "Passenger vehicles",
                dec!(16),
                14,
                true,
            ),
            category("trucks", "transport", "Trucks and vans", dec!(20), 10, true),
            category(
                "computer-equipment",
                "it",
                "Computer equipment",
                dec!(25),
                8,
                true,
            ),
            category("software", "it", "Software", dec!(33), 6, true),
            category("tools", "tools", "Tools and utensils", dec!(25), 8, false),
        ];
        let simplified = vec![
            category(
                "buildings",
                "buildings",
                "Buildings and other constructions",
                dec!(3),
                68,
                false,
            ),
            category(
                "installations-furniture",
                "installations",
                "Installations, furniture and fittings",
                dec!(10),
                20,
                false,
            ),
            category("machinery", "machinery", "Machinery", dec!(12), 18, true),
            category(
                "vehicles",
                "transport",
                "Transport vehicles",
                dec!(16),
                14,
                true,
            ),
            category(
                "computer-equipment",
                "it",
                "Data processing equipment",
                dec!(26),
                10,
                true,
            ),
            category("software", "it", "Software", dec!(26), 10, true),
            category("tools", "tools", "Tools and utensils", dec!(30), 8, false),
            category("livestock", "livestock", "Livestock", dec!(16), 14, false),
        ];
        CatalogTables {
            regimes: BTreeMap::from([
                ("general".to_string(), general),
                ("simplified".to_string(), simplified),
            ]),
        }
    }
}

fn category(
    id: &str,
    family: &str,
    name: &str,
    max_rate_percent: Decimal,
    max_period_years: u32,
    allows_incentive: bool,
) -> AssetCategory {
    AssetCategory {
        id: id.to_string(),
        family: family.to_string(),
        name: name.to_string(),
        max_rate_percent,
        max_period_years,
        allows_incentive,
    }
}

/// Shared, swappable catalog.
///
/// Readers take an `Arc` snapshot and keep using it for the whole calculation;
/// `replace_all` validates the new tables first and then swaps the pointer,
/// so a reader sees either the old tables or the new ones, never a mix.
#[derive(Debug)]
pub struct CatalogRegistry {
    current: RwLock<Arc<CatalogTables>>,
}

impl CatalogRegistry {
    pub fn with_defaults() -> Self {
        CatalogRegistry {
            current: RwLock::new(Arc::new(CatalogTables::builtin())),
        }
    }

    pub fn snapshot(&self) -> Arc<CatalogTables> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn get(&self, regime: &str, category_id: &str) -> CalcResult<AssetCategory> {
        self.snapshot().get(regime, category_id).cloned()
    }

    /// Replace every table at once. On error the current tables are kept.
    pub fn replace_all(&self, tables: CatalogTables) -> CalcResult<()> {
        tables.validate()?;
        let next = Arc::new(tables);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
        log::info!("catalog replaced: {} regimes", guard.regimes.len());
        Ok(())
    }
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        CatalogRegistry::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn minimal(rate: Decimal) -> BTreeMap<String, Vec<AssetCategory>> {
        BTreeMap::from([
            (
                "general".to_string(),
                vec![category("vans", "transport", "Vans", rate, 10, true)],
            ),
            (
                "simplified".to_string(),
                vec![category("vans", "transport", "Vans", rate, 10, true)],
            ),
        ])
    }

    #[test]
    fn builtin_tables_are_valid() {
        let tables = CatalogTables::builtin();
        tables.validate().unwrap();
        let vehicles = tables.get("general", "passenger-vehicles").unwrap();
        assert_eq!(vehicles.max_rate_percent, dec!(16));
        assert!(vehicles.allows_incentive);
    }

    #[test]
    fn unknown_category_is_not_found() {
        let registry = CatalogRegistry::with_defaults();
        let err = registry.get("general", "spaceships").unwrap_err();
        assert_eq!(
            err,
            CalcError::NotFound {
                regime: "general".to_string(),
                category: "spaceships".to_string(),
            }
        );
        assert!(registry.get("nope", "machinery").is_err());
    }

    #[test]
    fn replace_all_swaps_tables() {
        let registry = CatalogRegistry::with_defaults();
        registry
            .replace_all(CatalogTables::new(minimal(dec!(20))).unwrap())
            .unwrap();
        assert_eq!(
            registry.get("general", "vans").unwrap().max_rate_percent,
            dec!(20)
        );
        assert!(registry.get("general", "machinery").is_err());
    }

    #[test]
    fn missing_regime_rejected_and_tables_kept() {
        let registry = CatalogRegistry::with_defaults();
        let mut regimes = minimal(dec!(20));
        regimes.remove("simplified");
        let tables = CatalogTables { regimes };

        let err = registry.replace_all(tables).unwrap_err();
        assert!(matches!(err, CalcError::Configuration(_)));
        assert!(registry.get("general", "machinery").is_ok());
    }

    #[test]
    fn invalid_record_rejects_whole_import() {
        let registry = CatalogRegistry::with_defaults();
        let mut regimes = minimal(dec!(20));
        regimes
            .get_mut("simplified")
            .unwrap()
            .push(category("bad", "x", "Bad", dec!(120), 5, false));
        assert!(registry.replace_all(CatalogTables { regimes }).is_err());
        assert!(registry.get("general", "vans").is_err());
        assert!(registry.get("general", "machinery").is_ok());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut regimes = minimal(dec!(20));
        regimes
            .get_mut("general")
            .unwrap()
            .push(category("vans", "transport", "Vans again", dec!(10), 10, false));
        assert!(CatalogTables::new(regimes).is_err());
    }

    #[test]
    fn zero_period_and_rate_rejected() {
        let mut regimes = minimal(dec!(20));
        regimes.get_mut("general").unwrap()[0].max_period_years = 0;
        assert!(CatalogTables::new(regimes).is_err());
        assert!(CatalogTables::new(minimal(Decimal::ZERO)).is_err());
    }

    #[test]
    fn snapshot_survives_replacement() {
        let registry = CatalogRegistry::with_defaults();
        let before = registry.snapshot();
        registry
            .replace_all(CatalogTables::new(minimal(dec!(20))).unwrap())
            .unwrap();
        assert!(before.get("general", "machinery").is_ok());
        assert!(registry.snapshot().get("general", "machinery").is_err());
    }

    #[test]
    fn concurrent_readers_see_whole_tables() {
        let registry = Arc::new(CatalogRegistry::with_defaults());
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let tables = registry.snapshot();
                        let general = tables.categories("general").unwrap().len();
                        let simplified = tables.categories("simplified").unwrap().len();
                        // builtin: 12 + 8, replacement: 1 + 1
                        assert!(
                            (general, simplified) == (12, 8) || (general, simplified) == (1, 1)
                        );
                    }
                })
            })
            .collect();

        for rate in [dec!(10), dec!(20), dec!(30)] {
            registry
                .replace_all(CatalogTables::new(minimal(rate)).unwrap())
                .unwrap();
            registry.replace_all(CatalogTables::builtin()).unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn import_document_parses() {
        let json = r#"{
            "general": [{"id": "vans", "family": "transport", "name": "Vans",
                         "maxRatePercent": 16, "maxPeriodYears": 14, "allowsIncentive": true}],
            "simplified": [{"id": "vans", "family": "transport", "name": "Vans",
                            "maxRatePercent": 16, "maxPeriodYears": 14, "allowsIncentive": false}]
        }"#;
        let tables = CatalogTables::from_json(json.as_bytes()).unwrap();
        assert!(tables.get("general", "vans").unwrap().allows_incentive);
        assert!(!tables.get("simplified", "vans").unwrap().allows_incentive);

        // every record must say whether incentives apply
        let without_flag = json.replace(r#", "allowsIncentive": false"#, "");
        assert!(CatalogTables::from_json(without_flag.as_bytes()).is_err());

        let missing = r#"{"general": []}"#;
        assert!(CatalogTables::from_json(missing.as_bytes()).is_err());
    }
}
