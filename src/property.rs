use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::db::establish_connection;
use crate::error::AppError;
use crate::models::{NewProperty, Property};
use crate::AppState;

/// Catalog search filters. All optional; absent means "don't filter".
#[derive(Deserialize, Default)]
pub struct PropertyFilters {
    pub location: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub bedrooms: Option<i16>,
    pub bathrooms: Option<i16>,
    pub featured: Option<bool>,
    pub highlighted: Option<bool>,
    #[serde(rename = "new")]
    pub is_new: Option<bool>,
}

/// Public catalog listing: active properties, newest first.
pub async fn get_properties(
    State(_state): State<AppState>,
    Query(filters): Query<PropertyFilters>,
) -> Result<Json<Vec<Property>>, AppError> {
    use crate::schema::properties::dsl::*;

    let mut conn = establish_connection()?;
    let mut query = properties
        .filter(is_active.eq(true))
        .order_by(created_at.desc())
        .into_boxed();

    if let Some(term) = &filters.location {
        query = query.filter(location.ilike(format!("%{}%", term)));
    }
    if let Some(min) = filters.min_price {
        query = query.filter(price.ge(min));
    }
    if let Some(max) = filters.max_price {
        query = query.filter(price.le(max));
    }
    if let Some(beds) = filters.bedrooms {
        query = query.filter(bedrooms.ge(beds));
    }
    if let Some(baths) = filters.bathrooms {
        query = query.filter(bathrooms.ge(baths));
    }
    if let Some(flag) = filters.featured {
        query = query.filter(is_featured.eq(flag));
    }
    if let Some(flag) = filters.highlighted {
        query = query.filter(is_highlighted.eq(flag));
    }
    if let Some(flag) = filters.is_new {
        query = query.filter(is_new.eq(flag));
    }

    let results = query.load::<Property>(&mut conn)?;
    info!("Fetched {} properties", results.len());
    Ok(Json(results))
}

/// Detail lookup for the public catalog. Delisted rows are invisible here;
/// admin mutation paths load by id on their own.
fn active_detail(
    property_id: Uuid,
) -> crate::schema::properties::BoxedQuery<'static, diesel::pg::Pg> {
    use crate::schema::properties::dsl::*;

    properties
        .filter(id.eq(property_id))
        .filter(is_active.eq(true))
        .into_boxed()
}

pub async fn get_property(
    State(_state): State<AppState>,
    Path(property_id): Path<Uuid>,
) -> Result<Json<Property>, AppError> {
    let mut conn = establish_connection()?;
    let property = active_detail(property_id)
        .first::<Property>(&mut conn)
        .optional()?
        .ok_or(AppError::NotFound("Property"))?;
    Ok(Json(property))
}

pub async fn create_property(
    State(_state): State<AppState>,
    Json(new_property): Json<NewProperty>,
) -> Result<Json<Property>, AppError> {
    use crate::schema::properties;

    if new_property.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }

    let mut conn = establish_connection()?;
    let now = Utc::now().naive_utc();
    let property = Property {
        id: Uuid::new_v4(),
        title: new_property.title,
        description: new_property.description,
        price: new_property.price,
        location: new_property.location,
        address: new_property.address,
        square_feet: new_property.square_feet,
        bedrooms: new_property.bedrooms,
        bathrooms: new_property.bathrooms,
        images: Vec::new(),
        is_featured: new_property.is_featured,
        is_highlighted: new_property.is_highlighted,
        is_new: new_property.is_new,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(properties::table)
        .values(&property)
        .execute(&mut conn)?;
    info!("Created property {}", property.id);
    Ok(Json(property))
}

#[derive(Deserialize)]
pub struct UpdateProperty {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub address: String,
    pub square_feet: i64,
    pub bedrooms: i16,
    pub bathrooms: i16,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_highlighted: bool,
    #[serde(default)]
    pub is_new: bool,
    pub is_active: Option<bool>,
}

pub async fn update_property(
    State(_state): State<AppState>,
    Path(property_id): Path<Uuid>,
    Json(update): Json<UpdateProperty>,
) -> Result<Json<Property>, AppError> {
    use crate::schema::properties::dsl::*;

    let mut conn = establish_connection()?;
    let existing = properties
        .filter(id.eq(property_id))
        .first::<Property>(&mut conn)
        .optional()?
        .ok_or(AppError::NotFound("Property"))?;

    diesel::update(properties.filter(id.eq(property_id)))
        .set((
            title.eq(&update.title),
            description.eq(&update.description),
            price.eq(update.price),
            location.eq(&update.location),
            address.eq(&update.address),
            square_feet.eq(update.square_feet),
            bedrooms.eq(update.bedrooms),
            bathrooms.eq(update.bathrooms),
            is_featured.eq(update.is_featured),
            is_highlighted.eq(update.is_highlighted),
            is_new.eq(update.is_new),
            is_active.eq(update.is_active.unwrap_or(existing.is_active)),
            updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated = properties
        .filter(id.eq(property_id))
        .first::<Property>(&mut conn)?;
    Ok(Json(updated))
}

pub async fn delete_property(
    State(_state): State<AppState>,
    Path(property_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    use crate::schema::properties::dsl::*;

    let mut conn = establish_connection()?;
    let deleted = diesel::delete(properties.filter(id.eq(property_id))).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::NotFound("Property"));
    }
    info!("Deleted property {}", property_id);
    Ok(Json(serde_json::json!({ "status": "Property deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_detail_only_matches_active_listings() {
        let query = active_detail(Uuid::new_v4());
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&query).to_string();
        assert!(sql.contains("is_active"), "detail query must gate on is_active: {}", sql);
    }
}
