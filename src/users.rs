use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::{create_token, hash_password, verify_password, Role};
use crate::db::establish_connection;
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(login): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    use crate::schema::users::dsl::*;

    let mut conn = establish_connection()?;
    let user = users
        .filter(username.eq(&login.username))
        .first::<User>(&mut conn)
        .optional()?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&login.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let token = create_token(&user.id.to_string(), &user.role, &state.config.jwt_secret)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    info!("User {} logged in", user.username);
    Ok(Json(json!({ "token": token, "role": user.role })))
}

pub async fn get_users(State(_state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    use crate::schema::users::dsl::*;

    let mut conn = establish_connection()?;
    let results = users.order_by(created_at.asc()).load::<User>(&mut conn)?;
    Ok(Json(results))
}

pub async fn create_user(
    State(_state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<Json<User>, AppError> {
    use crate::schema::users;

    if new_user.username.trim().is_empty() || new_user.password.is_empty() {
        return Err(AppError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let mut conn = establish_connection()?;
    let user = User {
        id: Uuid::new_v4(),
        username: new_user.username,
        email: new_user.email,
        password_hash: hash_password(&new_user.password)?,
        role: Role::parse(&new_user.role).as_str().to_string(),
        created_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(users::table)
        .values(&user)
        .execute(&mut conn)
        .map_err(map_insert_error)?;
    info!("Created user {} with role {}", user.username, user.role);
    Ok(Json(user))
}

/// A taken username is admin input error, not a server fault.
fn map_insert_error(e: diesel::result::Error) -> AppError {
    match e {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ) => AppError::BadRequest("username is already taken".to_string()),
        other => AppError::Database(other),
    }
}

#[derive(Deserialize)]
pub struct RoleUpdate {
    pub role: String,
}

pub async fn update_user_role(
    State(_state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(update): Json<RoleUpdate>,
) -> Result<Json<User>, AppError> {
    use crate::schema::users::dsl::*;

    let mut conn = establish_connection()?;
    let normalized = Role::parse(&update.role).as_str();
    let updated_rows = diesel::update(users.filter(id.eq(user_id)))
        .set(role.eq(normalized))
        .execute(&mut conn)?;
    if updated_rows == 0 {
        return Err(AppError::NotFound("User"));
    }

    let user = users.filter(id.eq(user_id)).first::<User>(&mut conn)?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    use crate::schema::users::dsl::*;

    let mut conn = establish_connection()?;
    let deleted = diesel::delete(users.filter(id.eq(user_id))).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::NotFound("User"));
    }
    info!("Deleted user {}", user_id);
    Ok(Json(json!({ "status": "User deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    #[test]
    fn duplicate_username_maps_to_bad_request() {
        let e = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        );
        assert!(matches!(map_insert_error(e), AppError::BadRequest(_)));
    }

    #[test]
    fn other_database_errors_stay_database_errors() {
        assert!(matches!(
            map_insert_error(DieselError::NotFound),
            AppError::Database(_)
        ));
    }
}
