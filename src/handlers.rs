use crate::calendar::{parse_date_input, today};
use crate::errors::AppError;
use crate::models::{
    CalendarDay, CreateHabitRequest, CreatedHabit, DayQuery, DayResponse, SummaryRow,
    ToggleResponse,
};
use crate::queries;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

pub async fn create_habit(
    State(state): State<AppState>,
    Json(payload): Json<CreateHabitRequest>,
) -> Result<Json<CreatedHabit>, AppError> {
    let week_days = validate_week_days(&payload.week_days)?;

    let mut conn = state.db.lock().await;
    let habit = queries::create_habit(&mut conn, &payload.title, &week_days, today())?;

    info!(habit_id = %habit.id, week_days = ?habit.week_days, "habit created");
    Ok(Json(habit))
}

pub async fn get_day(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayResponse>, AppError> {
    let date = parse_date_input(&query.date)
        .ok_or_else(|| AppError::bad_request(format!("invalid date: {}", query.date)))?;

    let conn = state.db.lock().await;
    Ok(Json(queries::day_habits(&conn, date)?))
}

pub async fn toggle_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let habit_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::bad_request(format!("invalid habit id: {id}")))?
        .to_string();

    let mut conn = state.db.lock().await;
    let toggled = queries::toggle_habit(&mut conn, &habit_id, today())?;

    info!(
        habit_id = %toggled.habit_id,
        date = %toggled.date,
        completed = toggled.completed,
        "habit toggled"
    );
    Ok(Json(toggled))
}

pub async fn get_summary(State(state): State<AppState>) -> Result<Json<Vec<SummaryRow>>, AppError> {
    let conn = state.db.lock().await;
    Ok(Json(queries::summary(&conn)?))
}

pub async fn get_calendar(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarDay>>, AppError> {
    let conn = state.db.lock().await;
    Ok(Json(queries::calendar_summary(&conn, today())?))
}

fn validate_week_days(raw: &[i64]) -> Result<Vec<u8>, AppError> {
    raw.iter()
        .map(|&value| match u8::try_from(value) {
            Ok(day) if day <= 6 => Ok(day),
            _ => Err(AppError::bad_request(format!(
                "week day out of range 0..=6: {value}"
            ))),
        })
        .collect()
}
