//! Aggregates consumed by the dashboard charts.

use std::collections::BTreeMap;

use axum::{extract::State, Extension, Json};

use crate::auth::Claims;
use crate::AppState;

/// GET /api/v1/stats/monthly-books - Books added per year.
pub async fn books_per_year(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
) -> Json<BTreeMap<String, usize>> {
    Json(state.library.books_added_per_year(&caller).await)
}

/// GET /api/v1/stats/user-roles - Accounts per role.
pub async fn users_per_role(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
) -> Json<BTreeMap<String, usize>> {
    Json(state.library.users_per_role(&caller).await)
}
