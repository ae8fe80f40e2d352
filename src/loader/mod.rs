//! Turns the source spreadsheet into the mineral and deposit collections.

pub mod estimates;
pub mod sheet;

use std::fmt;
use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Deposit, MineralRecord};
use crate::store::{read_collection, write_collection};

pub use sheet::SheetRow;

const DEFAULT_YEAR: i32 = 2024;

/// Startup failures. None of these can happen once the server is running.
#[derive(Debug)]
pub enum LoadError {
    MissingSpreadsheet(PathBuf),
    Spreadsheet(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidRecord(String),
    Seed(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::MissingSpreadsheet(path) => {
                write!(f, "Spreadsheet not found at {}", path.display())
            }
            LoadError::Spreadsheet(msg) => write!(f, "Could not read spreadsheet: {msg}"),
            LoadError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            LoadError::Json { path, source } => {
                write!(f, "{} is not valid JSON: {source}", path.display())
            }
            LoadError::InvalidRecord(msg) => write!(f, "Invalid record: {msg}"),
            LoadError::Seed(msg) => write!(f, "Could not initialise user accounts: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub minerals: Vec<MineralRecord>,
    pub deposits: Vec<Deposit>,
}

impl Dataset {
    /// One mineral record per (row, country) and one deposit per row whose
    /// first country has known coordinates.
    pub fn from_rows(rows: &[SheetRow]) -> Self {
        let now = Utc::now();
        let mut dataset = Dataset::default();

        for row in rows {
            let countries = split_countries(&row.countries);
            if countries.is_empty() {
                tracing::warn!(
                    "Row {}: {} lists no producing countries, skipped",
                    row.line,
                    row.mineral
                );
                continue;
            }

            for country in &countries {
                dataset.minerals.push(MineralRecord {
                    id: Uuid::new_v4(),
                    mineral_name: row.mineral.clone(),
                    country: country.clone(),
                    production_volume: row
                        .production
                        .unwrap_or_else(|| estimates::production(&row.mineral, country)),
                    reserves: row
                        .reserves
                        .unwrap_or_else(|| estimates::reserves(&row.mineral, country)),
                    price: row.price.unwrap_or_else(|| estimates::price(&row.mineral)),
                    uses: row.uses.clone(),
                    year: row.year.unwrap_or(DEFAULT_YEAR),
                    unit: "tonnes".to_string(),
                    created_at: now,
                });
            }

            let Some(first) = countries.first() else {
                continue;
            };
            let Some((latitude, longitude)) = estimates::centroid(first) else {
                continue;
            };
            dataset.deposits.push(Deposit {
                id: Uuid::new_v4(),
                mineral: row.mineral.clone(),
                location_name: format!("{} Deposit - {first}", row.mineral),
                country: first.clone(),
                latitude,
                longitude,
                reserves: row
                    .reserves
                    .unwrap_or_else(|| estimates::reserves(&row.mineral, first)),
                annual_production: row
                    .production
                    .unwrap_or_else(|| estimates::production(&row.mineral, first)),
                status: row.status.clone().unwrap_or_else(|| "Active".to_string()),
            });
        }

        dataset
    }

    fn validate(&self) -> Result<(), LoadError> {
        if let Some(bad) = self.deposits.iter().find(|d| !d.has_valid_coordinates()) {
            return Err(LoadError::InvalidRecord(format!(
                "deposit '{}' has coordinates ({}, {}) outside the valid range",
                bad.location_name, bad.latitude, bad.longitude
            )));
        }
        Ok(())
    }
}

/// Split "DRC, Zambia (minor), Morocco" into clean country names.
pub fn split_countries(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let name = part.split('(').next().unwrap_or_default().trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Load the JSON collections, regenerating them from the spreadsheet when
/// `minerals.json` does not exist yet.
pub async fn load_or_build(config: &Config) -> Result<Dataset, LoadError> {
    let minerals_path = config.minerals_file();
    let deposits_path = config.deposits_file();

    if let Some(minerals) = read_collection::<MineralRecord>(&minerals_path).await? {
        let deposits = match read_collection::<Deposit>(&deposits_path).await? {
            Some(deposits) => deposits,
            None => {
                tracing::warn!("{} is missing, no deposits loaded", deposits_path.display());
                Vec::new()
            }
        };
        let dataset = Dataset { minerals, deposits };
        dataset.validate()?;
        return Ok(dataset);
    }

    tracing::info!("Building collections from {}", config.spreadsheet.display());
    let spreadsheet = config.spreadsheet.clone();
    let sheet_name = config.sheet_name.clone();
    let rows = tokio::task::spawn_blocking(move || sheet::read_rows(&spreadsheet, &sheet_name))
        .await
        .map_err(|e| LoadError::Spreadsheet(format!("reader task failed: {e}")))??;
    tracing::info!("Read {} spreadsheet rows", rows.len());

    let dataset = Dataset::from_rows(&rows);
    dataset.validate()?;

    let persist = |path: PathBuf| {
        move |e: crate::error::AppError| LoadError::Io {
            path,
            source: std::io::Error::other(e.to_string()),
        }
    };
    write_collection(&minerals_path, &dataset.minerals)
        .await
        .map_err(persist(minerals_path.clone()))?;
    write_collection(&deposits_path, &dataset.deposits)
        .await
        .map_err(persist(deposits_path.clone()))?;

    tracing::info!(
        "Converted to {} mineral records and {} deposits",
        dataset.minerals.len(),
        dataset.deposits.len()
    );
    Ok(dataset)
}
