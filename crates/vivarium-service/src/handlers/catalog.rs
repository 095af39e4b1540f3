//! Catalog query handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use vivarium_core::{Product, ProductId, SaleState, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// List the full catalog.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list()?))
}

/// Get a single product.
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    state
        .catalog
        .get(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("product {id}")))
}

/// Sale status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// The product.
    pub product_id: ProductId,
    /// Current sale state.
    pub status: SaleState,
    /// Owner, null while available.
    pub owner_id: Option<UserId>,
}

/// Get the effective sale status of a product.
///
/// Never 404s: a product with no sale record is simply `available`. Reads
/// go through `resolve_sale_status` so a half-written sale is repaired
/// before it is reported.
pub async fn get_product_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProductId>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = state.ownership.resolve_sale_status(&id)?;

    Ok(Json(StatusResponse {
        product_id: status.product_id,
        status: status.status,
        owner_id: status.owner_id,
    }))
}
