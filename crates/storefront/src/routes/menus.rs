//! Weekly menus.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use secret_menu_core::menu::WeekMenu;

use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MenusResponse {
    pub weeks: Vec<WeekMenu>,
}

/// All published weeks, oldest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<MenusResponse> {
    Json(MenusResponse {
        weeks: state.menus().weeks().to_vec(),
    })
}

/// The week being served today, else the next one, else the latest.
#[instrument(skip(state))]
pub async fn current(State(state): State<AppState>) -> Result<Json<WeekMenu>> {
    let today = Utc::now().date_naive();
    state
        .menus()
        .current_week(today)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No menus published".to_owned()))
}

/// One week by id.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<WeekMenu>> {
    state
        .menus()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Menu not found: {id}")))
}
