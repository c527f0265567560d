use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::establish_connection;
use crate::error::AppError;
use crate::models::Property;
use crate::AppState;

pub mod restore;
pub mod validate;

pub use restore::{restore_all, restore_property, RestoreOptions, RestoreReport};
pub use validate::{validate_filename, FileCheck};

/// Extensions accepted for property photos.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];
/// Upload ceiling, also enforced when validating existing files.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
/// Images larger than this on their longest edge get a resized derivative.
const MAX_EDGE_PX: u32 = 1600;

#[derive(Serialize)]
pub struct UploadReport {
    pub property_id: Uuid,
    pub saved: Vec<String>,
    pub errors: Vec<String>,
}

pub fn extension_allowed(filename: &str) -> bool {
    FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn extension_of(filename: &str) -> Option<String> {
    FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Writes one accepted upload under a fresh UUID filename and resizes it in
/// place when it exceeds the edge limit. Returns the stored filename.
fn store_image(
    uploads_dir: &FsPath,
    original_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, String> {
    match content_type {
        Some(mime) if ALLOWED_MIME_TYPES.contains(&mime) => {}
        Some(mime) => return Err(format!("{}: content type {} not allowed", original_name, mime)),
        None => return Err(format!("{}: missing content type", original_name)),
    }
    if bytes.is_empty() {
        return Err(format!("{}: empty file", original_name));
    }
    if bytes.len() as u64 > MAX_IMAGE_BYTES {
        return Err(format!(
            "{}: {} bytes exceeds limit of {} bytes",
            original_name,
            bytes.len(),
            MAX_IMAGE_BYTES
        ));
    }
    let ext = extension_of(original_name)
        .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| format!("{}: extension not allowed", original_name))?;

    let filename = format!("{}.{}", Uuid::new_v4(), ext);
    let dest = uploads_dir.join(&filename);
    std::fs::write(&dest, bytes)
        .map_err(|e| format!("{}: failed to write {}: {}", original_name, dest.display(), e))?;

    // Best effort: an undecodable but well-typed file is kept as uploaded.
    match image::load_from_memory(bytes) {
        Ok(img) if img.width().max(img.height()) > MAX_EDGE_PX => {
            let resized = img.resize(MAX_EDGE_PX, MAX_EDGE_PX, image::imageops::FilterType::Lanczos3);
            if let Err(e) = resized.save(&dest) {
                warn!("Failed to save resized derivative for {}: {}", filename, e);
            }
        }
        Ok(_) => {}
        Err(e) => warn!("Could not decode {} for resizing: {}", original_name, e),
    }

    Ok(filename)
}

/// Runs the allow-list checks and the write for every part of a batch. A
/// rejected part lands in the error list and the rest proceed.
fn store_batch(
    uploads_dir: &FsPath,
    parts: &[(String, Option<String>, Vec<u8>)],
) -> (Vec<String>, Vec<String>) {
    let mut saved = Vec::new();
    let mut errors = Vec::new();
    for (original_name, content_type, data) in parts {
        match store_image(uploads_dir, original_name, content_type.as_deref(), data) {
            Ok(filename) => {
                info!("Stored {} as {}", original_name, filename);
                saved.push(filename);
            }
            Err(reason) => {
                warn!("Rejected upload: {}", reason);
                errors.push(reason);
            }
        }
    }
    (saved, errors)
}

/// Accepts a multipart batch of photos for a property. Per-file failures are
/// collected and reported; accepted files are appended to the property's
/// image list in one write.
pub async fn upload_property_images(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>, AppError> {
    use crate::schema::properties::dsl::*;

    let config = &state.config;
    let mut conn = establish_connection()?;

    let property: Property = properties
        .filter(id.eq(property_id))
        .first(&mut conn)
        .optional()?
        .ok_or(AppError::NotFound("Property"))?;

    std::fs::create_dir_all(&config.uploads_dir)
        .map_err(|e| AppError::Internal(format!("Failed to create uploads dir: {}", e)))?;

    let mut parts = Vec::new();
    let mut upload_errors = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let original_name = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue, // not a file part
        };
        let content_type = field.content_type().map(|c| c.to_string());
        match field.bytes().await {
            Ok(bytes) => parts.push((original_name, content_type, bytes.to_vec())),
            Err(e) => {
                warn!("Failed to read upload {}: {}", original_name, e);
                upload_errors.push(format!("{}: {}", original_name, e));
            }
        }
    }

    let (saved, mut store_errors) = store_batch(&config.uploads_dir, &parts);
    upload_errors.append(&mut store_errors);

    if !saved.is_empty() {
        let mut image_list = property.images.clone();
        image_list.extend(saved.iter().cloned());
        diesel::update(properties.filter(id.eq(property_id)))
            .set((
                images.eq(&image_list),
                updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;
    }

    Ok(Json(UploadReport {
        property_id,
        saved,
        errors: upload_errors,
    }))
}

/// Drops a filename from the property's image list. The file itself stays on
/// disk so the assets backup and restore tooling can still see it.
pub async fn delete_property_image(
    State(_state): State<AppState>,
    Path((property_id, filename)): Path<(Uuid, String)>,
) -> Result<Json<Property>, AppError> {
    use crate::schema::properties::dsl::*;

    let mut conn = establish_connection()?;
    let property: Property = properties
        .filter(id.eq(property_id))
        .first(&mut conn)
        .optional()?
        .ok_or(AppError::NotFound("Property"))?;

    if !property.images.iter().any(|f| f == &filename) {
        return Err(AppError::NotFound("Image"));
    }

    let remaining: Vec<String> = property
        .images
        .iter()
        .filter(|f| *f != &filename)
        .cloned()
        .collect();
    diesel::update(properties.filter(id.eq(property_id)))
        .set((
            images.eq(&remaining),
            updated_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated: Property = properties.filter(id.eq(property_id)).first(&mut conn)?;
    Ok(Json(updated))
}

pub async fn validate_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<FileCheck>, AppError> {
    let config = &state.config;
    Ok(Json(validate_filename(
        &config.uploads_dir,
        &config.assets_dir,
        &filename,
    )))
}

#[derive(Deserialize)]
pub struct RestoreQuery {
    #[serde(default)]
    pub dry_run: bool,
}

pub async fn restore_property_handler(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
    Query(query): Query<RestoreQuery>,
) -> Result<Json<RestoreReport>, AppError> {
    use crate::schema::properties::dsl::*;

    let config = &state.config;
    let mut conn = establish_connection()?;
    let property: Property = properties
        .filter(id.eq(property_id))
        .first(&mut conn)
        .optional()?
        .ok_or(AppError::NotFound("Property"))?;

    let report = restore_property(
        &mut conn,
        &config.uploads_dir,
        &config.assets_dir,
        &property,
        RestoreOptions { dry_run: query.dry_run },
    );
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct RestoreAllReport {
    pub properties: Vec<RestoreReport>,
    pub total_restored: usize,
    pub total_missing: usize,
    pub dry_run: bool,
}

pub async fn restore_all_handler(
    State(state): State<AppState>,
    Query(query): Query<RestoreQuery>,
) -> Result<Json<RestoreAllReport>, AppError> {
    let config = &state.config;
    let mut conn = establish_connection()?;

    let reports = restore_all(
        &mut conn,
        &config.uploads_dir,
        &config.assets_dir,
        RestoreOptions { dry_run: query.dry_run },
    )?;
    let total_restored = reports.iter().map(|r| r.restored_images.len()).sum();
    let total_missing = reports.iter().map(|r| r.missing_files.len()).sum();
    Ok(Json(RestoreAllReport {
        properties: reports,
        total_restored,
        total_missing,
        dry_run: query.dry_run,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn extension_allow_list() {
        assert!(extension_allowed("photo.jpg"));
        assert!(extension_allowed("photo.JPEG"));
        assert!(extension_allowed("photo.webp"));
        assert!(!extension_allowed("photo.svg"));
        assert!(!extension_allowed("photo"));
    }

    #[test]
    fn store_rejects_disallowed_mime() {
        let dir = tempdir().unwrap();
        let err = store_image(dir.path(), "doc.jpg", Some("application/pdf"), b"data")
            .unwrap_err();
        assert!(err.contains("not allowed"));
    }

    #[test]
    fn store_rejects_missing_mime_and_empty_body() {
        let dir = tempdir().unwrap();
        assert!(store_image(dir.path(), "a.jpg", None, b"data").is_err());
        assert!(store_image(dir.path(), "a.jpg", Some("image/jpeg"), b"").is_err());
    }

    #[test]
    fn store_rejects_oversized_body() {
        let dir = tempdir().unwrap();
        let big = vec![0u8; (MAX_IMAGE_BYTES + 1) as usize];
        let err = store_image(dir.path(), "big.png", Some("image/png"), &big).unwrap_err();
        assert!(err.contains("exceeds limit"));
    }

    #[test]
    fn rejected_files_do_not_fail_the_accepted_ones() {
        let dir = tempdir().unwrap();
        let parts = vec![
            (
                "ok.png".to_string(),
                Some("image/png".to_string()),
                b"png bytes".to_vec(),
            ),
            (
                "big.png".to_string(),
                Some("image/png".to_string()),
                vec![0u8; (MAX_IMAGE_BYTES + 1) as usize],
            ),
        ];
        let (saved, errors) = store_batch(dir.path(), &parts);
        assert_eq!(saved.len(), 1);
        assert!(saved[0].ends_with(".png"));
        assert!(dir.path().join(&saved[0]).is_file());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("exceeds limit"));
    }

    #[test]
    fn store_writes_under_uuid_name_with_original_extension() {
        let dir = tempdir().unwrap();
        // Not a decodable image; resizing is skipped but the file is kept.
        let name = store_image(dir.path(), "house.png", Some("image/png"), b"fakepng").unwrap();
        assert!(name.ends_with(".png"));
        assert_ne!(name, "house.png");
        assert!(dir.path().join(&name).is_file());
    }
}
