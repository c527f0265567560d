use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use tracing::info;

use crate::db::establish_connection;
use crate::error::AppError;
use crate::models::{SiteSettings, UpdateSiteSettings};
use crate::AppState;

/// The one row holding site branding. Upserted on first write.
const SETTINGS_ID: i32 = 1;

pub async fn get_settings(State(_state): State<AppState>) -> Result<Json<SiteSettings>, AppError> {
    use crate::schema::site_settings::dsl::*;

    let mut conn = establish_connection()?;
    let settings = site_settings
        .filter(id.eq(SETTINGS_ID))
        .first::<SiteSettings>(&mut conn)
        .optional()?
        .ok_or(AppError::NotFound("Site settings"))?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(_state): State<AppState>,
    Json(update): Json<UpdateSiteSettings>,
) -> Result<Json<SiteSettings>, AppError> {
    use crate::schema::site_settings::dsl::*;

    let mut conn = establish_connection()?;
    let row = SiteSettings {
        id: SETTINGS_ID,
        site_name: update.site_name,
        logo: update.logo,
        contact_email: update.contact_email,
        contact_phone: update.contact_phone,
        address: update.address,
        facebook_url: update.facebook_url,
        instagram_url: update.instagram_url,
        whatsapp: update.whatsapp,
        updated_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(site_settings)
        .values(&row)
        .on_conflict(id)
        .do_update()
        .set(&row)
        .execute(&mut conn)?;
    info!("Updated site settings");

    let settings = site_settings
        .filter(id.eq(SETTINGS_ID))
        .first::<SiteSettings>(&mut conn)?;
    Ok(Json(settings))
}
