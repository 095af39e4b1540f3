//! Product records for the sellable catalog.
//!
//! A `Product` is the authoritative description of a sellable animal,
//! independent of its sale state. Records are created and updated only by
//! provider sync events; prices arrive in separate price events and are
//! stored as integer cents to avoid floating point drift.

use serde::{Deserialize, Serialize};

use crate::ProductId;

/// Default species when the provider metadata omits one.
pub const DEFAULT_SPECIES: &str = "ball_python";
/// Default morph when the provider metadata omits one.
pub const DEFAULT_MORPH: &str = "normal";
/// Default sex when the provider metadata omits one.
pub const DEFAULT_SEX: &str = "unknown";
/// Default birth year when the provider metadata omits one.
pub const DEFAULT_BIRTH_YEAR: i32 = 2024;
/// Default weight in grams when the provider metadata omits one.
pub const DEFAULT_WEIGHT_GRAMS: u32 = 100;
/// Source tag for provider-synced products.
pub const SOURCE_PROVIDER: &str = "stripe";

/// A sellable product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Provider-assigned identifier; opaque and unique.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,

    /// Species slug (e.g. `ball_python`).
    pub species: String,

    /// Morph slug (e.g. `banana`).
    pub morph: String,

    /// Sex (`male`, `female`, or `unknown`).
    pub sex: String,

    /// Year of birth.
    pub birth_year: i32,

    /// Weight in grams at listing time.
    pub weight_grams: u32,

    /// Price in minor currency units (cents). Absent until the first
    /// price event arrives.
    #[serde(default)]
    pub price_cents: Option<i64>,

    /// ISO currency code for `price_cents`.
    #[serde(default)]
    pub currency: Option<String>,

    /// Where this record came from (`stripe` for synced products).
    pub source: String,
}

/// Raw metadata fields carried on a provider product payload.
///
/// All fields are optional; normalization fills in defaults.
#[derive(Debug, Clone, Default)]
pub struct ProviderMetadata {
    /// Species slug, if tagged.
    pub species: Option<String>,
    /// Morph slug, if tagged.
    pub morph: Option<String>,
    /// Sex, if tagged.
    pub sex: Option<String>,
    /// Birth year, if tagged.
    pub birth_year: Option<i32>,
    /// Weight in grams, if tagged.
    pub weight_grams: Option<u32>,
}

impl Product {
    /// Normalize a provider product payload into a catalog record.
    ///
    /// Missing metadata fields fall back to the documented defaults so the
    /// game client always receives a complete record.
    #[must_use]
    pub fn from_provider(
        id: ProductId,
        name: String,
        description: Option<String>,
        images: Vec<String>,
        metadata: ProviderMetadata,
    ) -> Self {
        Self {
            id,
            name,
            description: description.unwrap_or_default(),
            images,
            species: metadata
                .species
                .unwrap_or_else(|| DEFAULT_SPECIES.to_string()),
            morph: metadata.morph.unwrap_or_else(|| DEFAULT_MORPH.to_string()),
            sex: metadata.sex.unwrap_or_else(|| DEFAULT_SEX.to_string()),
            birth_year: metadata.birth_year.unwrap_or(DEFAULT_BIRTH_YEAR),
            weight_grams: metadata.weight_grams.unwrap_or(DEFAULT_WEIGHT_GRAMS),
            price_cents: None,
            currency: None,
            source: SOURCE_PROVIDER.to_string(),
        }
    }

    /// Synthesize a minimal record for a product the catalog has never seen.
    ///
    /// Fulfillment must not fail just because a sync event was lost; the
    /// assignment carries this placeholder detail instead.
    #[must_use]
    pub fn placeholder(id: ProductId) -> Self {
        let name = format!("Snake {id}");
        Self {
            id,
            name,
            description: String::new(),
            images: Vec::new(),
            species: DEFAULT_SPECIES.to_string(),
            morph: DEFAULT_MORPH.to_string(),
            sex: DEFAULT_SEX.to_string(),
            birth_year: DEFAULT_BIRTH_YEAR,
            weight_grams: DEFAULT_WEIGHT_GRAMS,
            price_cents: None,
            currency: None,
            source: SOURCE_PROVIDER.to_string(),
        }
    }

    /// First image URL, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}
