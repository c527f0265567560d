use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{announcements, properties, site_settings, users};

#[derive(Serialize, Deserialize, Queryable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = properties)]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub address: String,
    pub square_feet: i64,
    pub bedrooms: i16,
    pub bathrooms: i16,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub is_highlighted: bool,
    pub is_new: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct NewProperty {
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
}

#[derive(Serialize, Deserialize, Queryable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = announcements)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub is_featured: bool,
    pub is_highlighted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_highlighted: bool,
}

#[derive(Serialize, Queryable, Insertable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Serialize, Deserialize, Queryable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = site_settings)]
#[diesel(treat_none_as_null = true)]
pub struct SiteSettings {
    pub id: i32,
    pub site_name: String,
    pub logo: Option<String>,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub whatsapp: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct UpdateSiteSettings {
    pub site_name: String,
    pub logo: Option<String>,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub whatsapp: Option<String>,
}
