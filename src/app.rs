use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, patch, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/habits", post(handlers::create_habit))
        .route("/habits/:id/toggle", patch(handlers::toggle_habit))
        .route("/day", get(handlers::get_day))
        .route("/summary", get(handlers::get_summary))
        .route("/summary/calendar", get(handlers::get_calendar))
        .with_state(state)
}
