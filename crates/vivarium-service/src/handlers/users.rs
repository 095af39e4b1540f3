//! User collection handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use vivarium_core::{PurchaseAssignment, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// List a user's purchase collection in acquisition order.
///
/// An unknown user is an empty array, never a 404; the game client polls
/// this before the first purchase lands.
pub async fn get_collection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<PurchaseAssignment>>, ApiError> {
    Ok(Json(state.ownership.list_user_assignments(&id)?))
}
