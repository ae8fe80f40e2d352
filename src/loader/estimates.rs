//! Fallback figures for spreadsheets that only name minerals and countries.

const DEFAULT_PRODUCTION: f64 = 10_000.0;
const DEFAULT_PRICE: f64 = 5_000.0;
const RESERVE_YEARS: f64 = 75.0;

const PRODUCTION: &[(&str, &str, f64)] = &[
    ("Cobalt", "DRC", 130_000.0),
    ("Cobalt", "Zambia", 5_000.0),
    ("Cobalt", "Morocco", 2_000.0),
    ("Manganese", "South Africa", 6_200_000.0),
    ("Manganese", "Gabon", 7_000_000.0),
    ("Manganese", "Ghana", 500_000.0),
    ("Lithium", "Zimbabwe", 1_200.0),
    ("Lithium", "DRC", 800.0),
    ("Lithium", "Mali", 300.0),
    ("Copper", "DRC", 1_500_000.0),
    ("Copper", "Zambia", 800_000.0),
    ("Copper", "South Africa", 50_000.0),
    ("Graphite (Natural)", "Mozambique", 30_000.0),
    ("Graphite (Natural)", "Madagascar", 50_000.0),
    ("Graphite (Natural)", "Tanzania", 15_000.0),
    ("Chromium", "South Africa", 18_000_000.0),
    ("Chromium", "Zimbabwe", 900_000.0),
];

// USD per tonne
const PRICES: &[(&str, f64)] = &[
    ("Cobalt", 32_000.0),
    ("Platinum-Group Metals (PGMs)", 850_000.0),
    ("Manganese", 1_800.0),
    ("Bauxite (for Aluminum)", 50.0),
    ("Graphite (Natural)", 1_200.0),
    ("Lithium", 25_000.0),
    ("Copper", 8_500.0),
    ("Nickel", 18_000.0),
    ("Chromium", 450.0),
    ("Uranium", 140_000.0),
    ("Rare Earth Elements (REEs)", 75_000.0),
];

const COUNTRY_CENTROIDS: &[(&str, f64, f64)] = &[
    ("DRC", -4.0, 23.0),
    ("South Africa", -29.0, 25.0),
    ("Zimbabwe", -19.0, 29.8),
    ("Zambia", -13.1, 27.8),
    ("Mozambique", -18.6, 35.5),
    ("Madagascar", -19.0, 46.3),
    ("Tanzania", -6.3, 34.8),
    ("Ghana", 7.9, -1.0),
    ("Guinea", 9.9, -9.6),
    ("Namibia", -22.5, 17.0),
    ("Gabon", -0.8, 11.6),
    ("Niger", 17.6, 8.0),
    ("Morocco", 31.7, -7.0),
];

pub fn production(mineral: &str, country: &str) -> f64 {
    PRODUCTION
        .iter()
        .find(|(m, c, _)| *m == mineral && *c == country)
        .map_or(DEFAULT_PRODUCTION, |(_, _, v)| *v)
}

pub fn reserves(mineral: &str, country: &str) -> f64 {
    production(mineral, country) * RESERVE_YEARS
}

pub fn price(mineral: &str) -> f64 {
    PRICES
        .iter()
        .find(|(m, _)| *m == mineral)
        .map_or(DEFAULT_PRICE, |(_, v)| *v)
}

/// Approximate (latitude, longitude) of a country, if known.
pub fn centroid(country: &str) -> Option<(f64, f64)> {
    COUNTRY_CENTROIDS
        .iter()
        .find(|(c, _, _)| *c == country)
        .map(|(_, lat, lon)| (*lat, *lon))
}
