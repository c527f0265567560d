#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    realty_site_backend::start_server().await
}
