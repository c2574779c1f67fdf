pub mod calendar;
pub mod catalog;
pub mod condition;
pub mod depreciation;
pub mod error;
pub mod lots;
pub mod scenario;
pub mod tiers;
pub mod validate;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use catalog::{AssetCategory, CatalogRegistry, CatalogTables};
pub use depreciation::{build_plan, DepreciationPlan, Incentive, IncentivePolicy, PlanRequest};
pub use error::{CalcError, CalcResult};
pub use lots::{realise_gain, AcquisitionLot, DisposalRequest, GainReport};
pub use scenario::{NewScenario, ScenarioKind, ScenarioStore};
pub use tiers::{breakdown, compute_tiered, effective_rate, TierPreset, TierTable};
