use std::collections::BTreeSet;
use std::path::PathBuf;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::loader::Dataset;
use crate::models::{Deposit, MineralPatch, MineralRecord};
use crate::store::write_collection;

/// Field filters for mineral records, combined with AND.
///
/// `mineral_name` and `country` match case-insensitively on the whole value,
/// `uses` on a substring, `year` exactly. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MineralQuery {
    pub mineral_name: Option<String>,
    pub country: Option<String>,
    pub uses: Option<String>,
    pub year: Option<i32>,
}

impl MineralQuery {
    /// Build a query from `field -> value` pairs. Unknown fields, blank values
    /// and unparsable years are ignored.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut query = Self::default();
        for (field, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match field.as_ref() {
                "mineral_name" | "mineral" => query.mineral_name = Some(value.to_string()),
                "country" => query.country = Some(value.to_string()),
                "uses" => query.uses = Some(value.to_string()),
                "year" => query.year = value.parse().ok(),
                _ => {}
            }
        }
        query
    }

    pub fn country(country: &str) -> Self {
        Self {
            country: Some(country.to_string()),
            ..Self::default()
        }
    }

    pub fn mineral(mineral_name: &str) -> Self {
        Self {
            mineral_name: Some(mineral_name.to_string()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, record: &MineralRecord) -> bool {
        self.mineral_name
            .as_deref()
            .is_none_or(|m| record.mineral_name.eq_ignore_ascii_case(m))
            && self
                .country
                .as_deref()
                .is_none_or(|c| record.country.eq_ignore_ascii_case(c))
            && self.uses.as_deref().is_none_or(|u| {
                record
                    .uses
                    .to_lowercase()
                    .contains(&u.to_lowercase())
            })
            && self.year.is_none_or(|y| record.year == y)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepositQuery {
    pub mineral: Option<String>,
    pub country: Option<String>,
}

impl DepositQuery {
    pub fn new(mineral: Option<&str>, country: Option<&str>) -> Self {
        let clean = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            mineral: clean(mineral),
            country: clean(country),
        }
    }

    pub fn matches(&self, deposit: &Deposit) -> bool {
        self.mineral
            .as_deref()
            .is_none_or(|m| deposit.mineral.eq_ignore_ascii_case(m))
            && self
                .country
                .as_deref()
                .is_none_or(|c| deposit.country.eq_ignore_ascii_case(c))
    }
}

pub fn filter_minerals(records: &[MineralRecord], query: &MineralQuery) -> Vec<MineralRecord> {
    records.iter().filter(|r| query.matches(r)).cloned().collect()
}

pub fn filter_deposits(deposits: &[Deposit], query: &DepositQuery) -> Vec<Deposit> {
    deposits.iter().filter(|d| query.matches(d)).cloned().collect()
}

/// Mineral and deposit collections, held in memory and written back to
/// `minerals.json` on edit.
pub struct RecordStore {
    minerals_path: PathBuf,
    minerals: RwLock<Vec<MineralRecord>>,
    deposits: Vec<Deposit>,
}

impl RecordStore {
    pub fn new(minerals_path: PathBuf, dataset: Dataset) -> Self {
        Self {
            minerals_path,
            minerals: RwLock::new(dataset.minerals),
            deposits: dataset.deposits,
        }
    }

    pub async fn search(&self, query: &MineralQuery) -> Vec<MineralRecord> {
        filter_minerals(&self.minerals.read().await, query)
    }

    pub async fn by_country(&self, country: &str) -> Vec<MineralRecord> {
        self.search(&MineralQuery::country(country)).await
    }

    pub fn deposits_for(&self, mineral: Option<&str>, country: Option<&str>) -> Vec<Deposit> {
        filter_deposits(&self.deposits, &DepositQuery::new(mineral, country))
    }

    pub async fn all_minerals(&self) -> Vec<MineralRecord> {
        self.minerals.read().await.clone()
    }

    pub async fn mineral(&self, id: Uuid) -> Result<MineralRecord, AppError> {
        self.minerals
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Mineral record not found".to_string()))
    }

    pub async fn unique_mineral_names(&self) -> Vec<String> {
        let minerals = self.minerals.read().await;
        let names: BTreeSet<&str> = minerals.iter().map(|r| r.mineral_name.as_str()).collect();
        names.into_iter().map(str::to_string).collect()
    }

    pub async fn unique_countries(&self) -> Vec<String> {
        let minerals = self.minerals.read().await;
        let countries: BTreeSet<&str> = minerals.iter().map(|r| r.country.as_str()).collect();
        countries.into_iter().map(str::to_string).collect()
    }

    pub async fn count_minerals(&self) -> usize {
        self.minerals.read().await.len()
    }

    pub async fn count_countries(&self) -> usize {
        self.unique_countries().await.len()
    }

    pub fn count_deposits(&self) -> usize {
        self.deposits.len()
    }

    /// Apply `patch` to one record and persist the collection.
    pub async fn update_mineral(
        &self,
        id: Uuid,
        patch: MineralPatch,
    ) -> Result<MineralRecord, AppError> {
        let negative = [patch.production_volume, patch.reserves, patch.price]
            .into_iter()
            .flatten()
            .any(|v| !v.is_finite() || v < 0.0);
        if negative {
            return Err(AppError::BadRequest(
                "Production, reserves and price must be non-negative numbers".to_string(),
            ));
        }

        let mut minerals = self.minerals.write().await;
        let index = minerals
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound("Mineral record not found".to_string()))?;

        let previous = minerals[index].clone();
        minerals[index].apply(patch);
        let updated = minerals[index].clone();

        if let Err(e) = write_collection(&self.minerals_path, &minerals).await {
            minerals[index] = previous;
            return Err(e);
        }

        tracing::info!(
            "Updated {} / {} ({})",
            updated.mineral_name,
            updated.country,
            updated.id
        );
        Ok(updated)
    }
}
