//! Bounded log of saved calculation scenarios, most recent first.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::io::{Read, Write};

pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Tax,
    Gains,
    Plan,
}

impl ScenarioKind {
    pub fn display(&self) -> &'static str {
        match self {
            ScenarioKind::Tax => "Tax",
            ScenarioKind::Gains => "Gains",
            ScenarioKind::Plan => "Plan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSnapshot {
    pub id: String,
    pub label: String,
    pub kind: ScenarioKind,
    pub inputs: serde_json::Value,
    pub computed_summary: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// A scenario about to be saved; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewScenario {
    pub label: String,
    pub kind: ScenarioKind,
    pub inputs: serde_json::Value,
    pub computed_summary: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioStore {
    capacity: usize,
    scenarios: VecDeque<ScenarioSnapshot>,
}

impl Default for ScenarioStore {
    fn default() -> Self {
        ScenarioStore::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ScenarioStore {
    pub fn with_capacity(capacity: usize) -> Self {
        ScenarioStore {
            capacity: capacity.max(1),
            scenarios: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a scenario, evicting the oldest once the store is full.
    pub fn save(&mut self, scenario: NewScenario, timestamp: DateTime<Utc>) -> String {
        let id = scenario_id(&scenario, timestamp);
        self.scenarios.retain(|s| s.id != id);
        self.scenarios.push_front(ScenarioSnapshot {
            id: id.clone(),
            label: scenario.label,
            kind: scenario.kind,
            inputs: scenario.inputs,
            computed_summary: scenario.computed_summary,
            timestamp,
        });
        while self.scenarios.len() > self.capacity {
            if let Some(evicted) = self.scenarios.pop_back() {
                log::debug!("evicted scenario {} ({})", evicted.id, evicted.label);
            }
        }
        id
    }

    pub fn list(&self) -> impl Iterator<Item = &ScenarioSnapshot> {
        self.scenarios.iter()
    }

    pub fn get(&self, id: &str) -> Option<&ScenarioSnapshot> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<ScenarioSnapshot> {
        let index = self.scenarios.iter().position(|s| s.id == id)?;
        self.scenarios.remove(index)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn read_json<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut store: ScenarioStore = serde_json::from_reader(reader)?;
        store.capacity = store.capacity.max(1);
        store.scenarios.truncate(store.capacity);
        Ok(store)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

fn scenario_id(scenario: &NewScenario, timestamp: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scenario.label.as_bytes());
    hasher.update(scenario.kind.display().as_bytes());
    hasher.update(scenario.inputs.to_string().as_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn scenario(label: &str) -> NewScenario {
        NewScenario {
            label: label.to_string(),
            kind: ScenarioKind::Tax,
            inputs: json!({ "base": label.len() }),
            computed_summary: json!({ "total": "0" }),
        }
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn lists_most_recent_first() {
        let mut store = ScenarioStore::default();
        store.save(scenario("first"), at(0));
        store.save(scenario("second"), at(1));
        let labels: Vec<_> = store.list().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["second", "first"]);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut store = ScenarioStore::with_capacity(3);
        for i in 0..5 {
            store.save(scenario(&format!("s{i}")), at(i));
        }
        let labels: Vec<_> = store.list().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["s4", "s3", "s2"]);
    }

    #[test]
    fn ids_are_stable_and_distinct() {
        let mut store = ScenarioStore::default();
        let a = store.save(scenario("a"), at(0));
        let b = store.save(scenario("b"), at(0));
        assert_ne!(a, b);
        assert_eq!(a.len(), 12);
        assert_eq!(a, scenario_id(&scenario("a"), at(0)));
        assert_eq!(store.get(&a).unwrap().label, "a");
    }

    #[test]
    fn saving_same_scenario_twice_keeps_one() {
        let mut store = ScenarioStore::default();
        store.save(scenario("a"), at(0));
        store.save(scenario("a"), at(0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_by_id() {
        let mut store = ScenarioStore::default();
        let id = store.save(scenario("a"), at(0));
        assert!(store.remove(&id).is_some());
        assert!(store.is_empty());
        assert!(store.remove(&id).is_none());
    }

    #[test]
    fn json_round_trip_keeps_order() {
        let mut store = ScenarioStore::with_capacity(5);
        store.save(scenario("a"), at(0));
        store.save(scenario("b"), at(1));

        let mut buffer = Vec::new();
        store.write_json(&mut buffer).unwrap();
        let restored = ScenarioStore::read_json(buffer.as_slice()).unwrap();
        assert_eq!(restored, store);
        assert_eq!(restored.capacity(), 5);
    }
}
