use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::db::establish_connection;
use crate::error::AppError;
use crate::models::{Announcement, NewAnnouncement};
use crate::AppState;

/// Public feed: announcements whose active window contains now.
pub async fn get_active_announcements(
    State(_state): State<AppState>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    use crate::schema::announcements::dsl::*;

    let mut conn = establish_connection()?;
    let now = Utc::now().naive_utc();
    let results = announcements
        .filter(starts_at.le(now))
        .filter(ends_at.ge(now))
        .order_by(starts_at.desc())
        .load::<Announcement>(&mut conn)?;
    Ok(Json(results))
}

/// Admin listing: every announcement regardless of window.
pub async fn get_all_announcements(
    State(_state): State<AppState>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    use crate::schema::announcements::dsl::*;

    let mut conn = establish_connection()?;
    let results = announcements
        .order_by(starts_at.desc())
        .load::<Announcement>(&mut conn)?;
    Ok(Json(results))
}

pub async fn create_announcement(
    State(_state): State<AppState>,
    Json(new_announcement): Json<NewAnnouncement>,
) -> Result<Json<Announcement>, AppError> {
    use crate::schema::announcements;

    if new_announcement.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    if new_announcement.ends_at < new_announcement.starts_at {
        return Err(AppError::BadRequest(
            "ends_at is before starts_at".to_string(),
        ));
    }

    let mut conn = establish_connection()?;
    let now = Utc::now().naive_utc();
    let announcement = Announcement {
        id: Uuid::new_v4(),
        title: new_announcement.title,
        body: new_announcement.body,
        image: new_announcement.image,
        starts_at: new_announcement.starts_at,
        ends_at: new_announcement.ends_at,
        is_featured: new_announcement.is_featured,
        is_highlighted: new_announcement.is_highlighted,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(announcements::table)
        .values(&announcement)
        .execute(&mut conn)?;
    info!("Created announcement {}", announcement.id);
    Ok(Json(announcement))
}

pub async fn update_announcement(
    State(_state): State<AppState>,
    Path(announcement_id): Path<Uuid>,
    Json(update): Json<NewAnnouncement>,
) -> Result<Json<Announcement>, AppError> {
    use crate::schema::announcements::dsl::*;

    if update.ends_at < update.starts_at {
        return Err(AppError::BadRequest(
            "ends_at is before starts_at".to_string(),
        ));
    }

    let mut conn = establish_connection()?;
    let updated_rows = diesel::update(announcements.filter(id.eq(announcement_id)))
        .set((
            title.eq(&update.title),
            body.eq(&update.body),
            image.eq(&update.image),
            starts_at.eq(update.starts_at),
            ends_at.eq(update.ends_at),
            is_featured.eq(update.is_featured),
            is_highlighted.eq(update.is_highlighted),
            updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;
    if updated_rows == 0 {
        return Err(AppError::NotFound("Announcement"));
    }

    let updated = announcements
        .filter(id.eq(announcement_id))
        .first::<Announcement>(&mut conn)?;
    Ok(Json(updated))
}

pub async fn delete_announcement(
    State(_state): State<AppState>,
    Path(announcement_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    use crate::schema::announcements::dsl::*;

    let mut conn = establish_connection()?;
    let deleted = diesel::delete(announcements.filter(id.eq(announcement_id))).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::NotFound("Announcement"));
    }
    info!("Deleted announcement {}", announcement_id);
    Ok(Json(serde_json::json!({ "status": "Announcement deleted" })))
}
