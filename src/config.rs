use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub uploads_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl AppConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv().ok(); // Load .env file if present
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse()?,
            jwt_secret: env::var("JWT_SECRET")?,
            uploads_dir: env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            assets_dir: env::var("ASSETS_DIR")
                .unwrap_or_else(|_| "assets".to_string())
                .into(),
        })
    }
}
