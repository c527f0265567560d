use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Property;

#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreOptions {
    /// Compute the report without copying files or writing the database.
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct RestoreReport {
    pub property_id: Uuid,
    /// References that exist on disk after the run (the reconciled list).
    pub restored_images: Vec<String>,
    /// Subset of restored_images recovered from the assets backup.
    pub copied_from_assets: Vec<String>,
    /// References found in neither directory.
    pub missing_files: Vec<String>,
    pub errors: Vec<String>,
    pub dry_run: bool,
}

/// What a restore run would do, decided purely from the referenced list and
/// the two directory snapshots. Dry run and the real run share this.
#[derive(Debug, PartialEq)]
pub struct RestorePlan {
    /// Already present in uploads; nothing to do.
    pub keep: Vec<String>,
    /// Present only in assets; copy into uploads.
    pub copy: Vec<String>,
    /// Present nowhere; drop from the record.
    pub missing: Vec<String>,
}

pub fn plan_restore(
    referenced: &[String],
    in_uploads: &HashSet<String>,
    in_assets: &HashSet<String>,
) -> RestorePlan {
    let mut seen = HashSet::new();
    let mut plan = RestorePlan {
        keep: Vec::new(),
        copy: Vec::new(),
        missing: Vec::new(),
    };
    for filename in referenced {
        if !seen.insert(filename.as_str()) {
            continue; // duplicate reference
        }
        if in_uploads.contains(filename) {
            plan.keep.push(filename.clone());
        } else if in_assets.contains(filename) {
            plan.copy.push(filename.clone());
        } else {
            plan.missing.push(filename.clone());
        }
    }
    plan
}

/// Snapshot of the plain files in a directory. A missing directory is an
/// empty snapshot, not an error.
pub fn dir_snapshot(dir: &Path) -> HashSet<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read {}: {}", dir.display(), e);
            return HashSet::new();
        }
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}

/// Carries out (or, on dry run, merely echoes) the copy half of a plan.
/// Returns what got copied, what is missing after the attempt, and per-file
/// errors.
fn execute_plan(
    uploads_dir: &Path,
    assets_dir: &Path,
    plan: &RestorePlan,
    dry_run: bool,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut copied = Vec::new();
    let mut missing = plan.missing.clone();
    let mut errors = Vec::new();

    if dry_run {
        copied = plan.copy.clone();
        return (copied, missing, errors);
    }

    for filename in &plan.copy {
        let src = assets_dir.join(filename);
        let dest = uploads_dir.join(filename);
        match std::fs::copy(&src, &dest) {
            Ok(_) => {
                info!("Recovered {} from assets", filename);
                copied.push(filename.clone());
            }
            Err(e) => {
                warn!("Failed to copy {} from assets: {}", filename, e);
                errors.push(format!("{}: copy failed: {}", filename, e));
                missing.push(filename.clone());
            }
        }
    }
    (copied, missing, errors)
}

/// Reconciles one property's image references with the filesystem. All
/// failures are per-file: a copy that fails demotes that file to missing and
/// the run continues.
pub fn restore_property(
    conn: &mut PgConnection,
    uploads_dir: &Path,
    assets_dir: &Path,
    property: &Property,
    opts: RestoreOptions,
) -> RestoreReport {
    use crate::schema::properties::dsl::*;

    let in_uploads = dir_snapshot(uploads_dir);
    let in_assets = dir_snapshot(assets_dir);
    let plan = plan_restore(&property.images, &in_uploads, &in_assets);

    let (copied, missing, mut errors) =
        execute_plan(uploads_dir, assets_dir, &plan, opts.dry_run);

    // Reconciled list keeps the original reference order.
    let restored: Vec<String> = property
        .images
        .iter()
        .filter(|f| plan.keep.contains(*f) || copied.contains(*f))
        .cloned()
        .collect();

    if !opts.dry_run && restored != property.images {
        let write = diesel::update(properties.filter(id.eq(property.id)))
            .set((
                images.eq(&restored),
                updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(conn);
        if let Err(e) = write {
            warn!("Failed to update property {}: {}", property.id, e);
            errors.push(format!("database update failed: {}", e));
        }
    }

    RestoreReport {
        property_id: property.id,
        restored_images: restored,
        copied_from_assets: copied,
        missing_files: missing,
        errors,
        dry_run: opts.dry_run,
    }
}

/// Runs restore over every property. One broken property does not stop the
/// sweep; its error lands in that property's report.
pub fn restore_all(
    conn: &mut PgConnection,
    uploads_dir: &Path,
    assets_dir: &Path,
    opts: RestoreOptions,
) -> Result<Vec<RestoreReport>, diesel::result::Error> {
    use crate::schema::properties::dsl::*;

    let all: Vec<Property> = properties.order_by(created_at.asc()).load(conn)?;
    info!("Restoring image references for {} properties", all.len());

    Ok(all
        .iter()
        .map(|property| restore_property(conn, uploads_dir, assets_dir, property, opts))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn refs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_present_means_nothing_to_copy_and_nothing_missing() {
        let plan = plan_restore(
            &refs(&["a.jpg", "b.jpg"]),
            &set(&["a.jpg", "b.jpg"]),
            &set(&[]),
        );
        assert_eq!(plan.keep, refs(&["a.jpg", "b.jpg"]));
        assert!(plan.copy.is_empty());
        assert!(plan.missing.is_empty());
    }

    #[test]
    fn assets_only_files_are_scheduled_for_copy() {
        let plan = plan_restore(
            &refs(&["a.jpg", "b.jpg", "c.jpg"]),
            &set(&["a.jpg"]),
            &set(&["b.jpg"]),
        );
        assert_eq!(plan.keep, refs(&["a.jpg"]));
        assert_eq!(plan.copy, refs(&["b.jpg"]));
        assert_eq!(plan.missing, refs(&["c.jpg"]));
    }

    #[test]
    fn uploads_wins_over_assets() {
        let plan = plan_restore(&refs(&["a.jpg"]), &set(&["a.jpg"]), &set(&["a.jpg"]));
        assert_eq!(plan.keep, refs(&["a.jpg"]));
        assert!(plan.copy.is_empty());
    }

    #[test]
    fn duplicate_references_are_collapsed() {
        let plan = plan_restore(
            &refs(&["a.jpg", "a.jpg", "b.jpg"]),
            &set(&["a.jpg"]),
            &set(&[]),
        );
        assert_eq!(plan.keep, refs(&["a.jpg"]));
        assert_eq!(plan.missing, refs(&["b.jpg"]));
    }

    #[test]
    fn planning_is_idempotent_after_copy() {
        // After a run copies b.jpg into uploads, replanning keeps it.
        let plan = plan_restore(
            &refs(&["a.jpg", "b.jpg"]),
            &set(&["a.jpg", "b.jpg"]),
            &set(&["b.jpg"]),
        );
        assert_eq!(plan.keep, refs(&["a.jpg", "b.jpg"]));
        assert!(plan.copy.is_empty());
        assert!(plan.missing.is_empty());
    }

    #[test]
    fn dry_run_never_touches_the_filesystem() {
        let uploads = tempfile::tempdir().unwrap();
        let assets = tempfile::tempdir().unwrap();
        std::fs::write(assets.path().join("b.jpg"), b"backup bytes").unwrap();

        let plan = plan_restore(&refs(&["b.jpg"]), &set(&[]), &set(&["b.jpg"]));
        let (copied, missing, errors) = execute_plan(uploads.path(), assets.path(), &plan, true);

        assert_eq!(copied, refs(&["b.jpg"])); // reported as would-copy
        assert!(missing.is_empty());
        assert!(errors.is_empty());
        assert!(!uploads.path().join("b.jpg").exists());
    }

    #[test]
    fn real_run_copies_from_assets_into_uploads() {
        let uploads = tempfile::tempdir().unwrap();
        let assets = tempfile::tempdir().unwrap();
        std::fs::write(assets.path().join("b.jpg"), b"backup bytes").unwrap();

        let plan = plan_restore(&refs(&["b.jpg"]), &set(&[]), &set(&["b.jpg"]));
        let (copied, missing, errors) = execute_plan(uploads.path(), assets.path(), &plan, false);

        assert_eq!(copied, refs(&["b.jpg"]));
        assert!(missing.is_empty());
        assert!(errors.is_empty());
        assert_eq!(
            std::fs::read(uploads.path().join("b.jpg")).unwrap(),
            b"backup bytes"
        );
    }

    #[test]
    fn failed_copy_is_reported_and_demoted_to_missing() {
        let uploads = tempfile::tempdir().unwrap();
        let assets = tempfile::tempdir().unwrap();
        // Planned from a stale snapshot: the asset vanished before the copy.
        let plan = plan_restore(&refs(&["gone.jpg"]), &set(&[]), &set(&["gone.jpg"]));
        let (copied, missing, errors) = execute_plan(uploads.path(), assets.path(), &plan, false);

        assert!(copied.is_empty());
        assert_eq!(missing, refs(&["gone.jpg"]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("copy failed"));
    }

    #[test]
    fn snapshot_of_missing_directory_is_empty() {
        let snapshot = dir_snapshot(Path::new("/nonexistent/for/sure"));
        assert!(snapshot.is_empty());
    }

    #[test]
    fn snapshot_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("thumbs")).unwrap();
        let snapshot = dir_snapshot(dir.path());
        assert_eq!(snapshot, set(&["a.jpg"]));
    }
}
