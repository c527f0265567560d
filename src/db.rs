use diesel::pg::PgConnection;
use diesel::prelude::*;
use dotenv::dotenv;
use std::env;
use tracing::{error, info};

pub fn establish_connection() -> Result<PgConnection, ConnectionError> {
    // Try to load .env again to ensure environment variables are available
    dotenv().ok();

    match env::var("DATABASE_URL") {
        Ok(database_url) => match PgConnection::establish(&database_url) {
            Ok(conn) => Ok(conn),
            Err(e) => {
                error!("Failed to establish database connection: {}", e);
                Err(e)
            }
        },
        Err(e) => {
            error!("DATABASE_URL environment variable not found: {}", e);
            Err(ConnectionError::BadConnection(
                "DATABASE_URL environment variable not set".to_string(),
            ))
        }
    }
}

pub fn check_connection(database_url: &str) -> Result<(), ConnectionError> {
    let mut conn = PgConnection::establish(database_url)?;
    let result: i32 =
        diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("1"))
            .get_result(&mut conn)
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
    info!("Database test query result: {}", result);
    Ok(())
}
