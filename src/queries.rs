use crate::calendar::{self, HabitSchedule};
use crate::errors::{StoreError, StoreResult};
use crate::models::{CalendarDay, CreatedHabit, DayResponse, Habit, SummaryRow, ToggleResponse};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::BTreeMap;
use uuid::Uuid;

pub fn create_habit(
    conn: &mut Connection,
    title: &str,
    week_days: &[u8],
    today: NaiveDate,
) -> StoreResult<CreatedHabit> {
    let id = Uuid::new_v4().to_string();

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO habits (id, title, created_at) VALUES (?1, ?2, ?3)",
        params![id, title, today],
    )?;
    {
        let mut stmt =
            tx.prepare("INSERT INTO habit_week_days (habit_id, week_day) VALUES (?1, ?2)")?;
        for week_day in week_days {
            stmt.execute(params![id, week_day])?;
        }
    }
    tx.commit()?;

    Ok(CreatedHabit {
        id,
        title: title.to_string(),
        created_at: today,
        week_days: week_days.to_vec(),
    })
}

pub fn day_habits(conn: &Connection, date: NaiveDate) -> StoreResult<DayResponse> {
    let mut stmt = conn.prepare(
        "SELECT H.id, H.title, H.created_at
         FROM habits H
         WHERE H.created_at <= ?1
           AND EXISTS (
             SELECT 1 FROM habit_week_days HWD
             WHERE HWD.habit_id = H.id AND HWD.week_day = ?2
           )
         ORDER BY H.created_at ASC, H.title ASC",
    )?;
    let possible_habits = stmt
        .query_map(params![date, calendar::week_day(date)], map_habit)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT DISTINCT DH.habit_id
         FROM day_habits DH
         JOIN days D ON D.id = DH.day_id
         WHERE D.date = ?1
         ORDER BY DH.habit_id ASC",
    )?;
    let completed_habits = stmt
        .query_map(params![date], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DayResponse {
        possible_habits,
        completed_habits,
    })
}

pub fn toggle_habit(
    conn: &mut Connection,
    habit_id: &str,
    today: NaiveDate,
) -> StoreResult<ToggleResponse> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let known = tx
        .query_row("SELECT 1 FROM habits WHERE id = ?1", params![habit_id], |_| Ok(()))
        .optional()?;
    if known.is_none() {
        return Err(StoreError::HabitNotFound(habit_id.to_string()));
    }

    tx.execute(
        "INSERT OR IGNORE INTO days (id, date, week_day) VALUES (?1, ?2, ?3)",
        params![Uuid::new_v4().to_string(), today, calendar::week_day(today)],
    )?;
    let day_id: String =
        tx.query_row("SELECT id FROM days WHERE date = ?1", params![today], |row| {
            row.get(0)
        })?;

    let removed = tx.execute(
        "DELETE FROM day_habits WHERE day_id = ?1 AND habit_id = ?2",
        params![day_id, habit_id],
    )?;
    let completed = if removed == 0 {
        tx.execute(
            "INSERT INTO day_habits (day_id, habit_id) VALUES (?1, ?2)",
            params![day_id, habit_id],
        )?;
        true
    } else {
        false
    };

    tx.commit()?;

    Ok(ToggleResponse {
        habit_id: habit_id.to_string(),
        date: today,
        completed,
    })
}

pub fn summary(conn: &Connection) -> StoreResult<Vec<SummaryRow>> {
    let mut stmt = conn.prepare(
        "SELECT
           D.id,
           D.date,
           (
             SELECT COUNT(*)
             FROM day_habits DH
             WHERE DH.day_id = D.id
           ) AS completed,
           (
             SELECT COUNT(DISTINCT H.id)
             FROM habit_week_days HWD
             JOIN habits H ON H.id = HWD.habit_id
             WHERE HWD.week_day = D.week_day
               AND H.created_at <= D.date
           ) AS amount
         FROM days D
         ORDER BY D.date ASC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(SummaryRow {
                id: row.get("id")?,
                date: row.get("date")?,
                completed: row.get("completed")?,
                amount: row.get("amount")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn habit_schedules(conn: &Connection) -> StoreResult<Vec<HabitSchedule>> {
    let mut stmt = conn.prepare(
        "SELECT H.id, H.created_at, HWD.week_day
         FROM habits H
         JOIN habit_week_days HWD ON HWD.habit_id = H.id
         ORDER BY H.id ASC",
    )?;

    let mut schedules: BTreeMap<String, HabitSchedule> = BTreeMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, NaiveDate>(1)?,
            row.get::<_, u8>(2)?,
        ))
    })?;
    for row in rows {
        let (id, created_at, week_day) = row?;
        let schedule = schedules.entry(id).or_insert_with(|| HabitSchedule {
            created_at,
            week_days: Vec::new(),
        });
        if !schedule.week_days.contains(&week_day) {
            schedule.week_days.push(week_day);
        }
    }

    Ok(schedules.into_values().collect())
}

pub fn calendar_summary(conn: &Connection, today: NaiveDate) -> StoreResult<Vec<CalendarDay>> {
    let rows = summary(conn)?;
    let schedules = habit_schedules(conn)?;
    Ok(calendar::build_calendar_at(today, &rows, &schedules))
}

fn map_habit(row: &Row) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: row.get("id")?,
        title: row.get("title")?,
        created_at: row.get("created_at")?,
    })
}
