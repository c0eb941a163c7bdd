//! Log in, list baskets and search items
//!
//! Usage:
//!   BARGUNI_API_URL=http://localhost:8000 BARGUNI_EMAIL=me@example.com \
//!   BARGUNI_REFRESH_TOKEN=... cargo run --example basket_session

use barguni_client::{
    AuthClientConfig, AuthClientHttp, BarguniApi, MemoryCredentialStore, PlainClient, Session,
    SessionTokens,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Configuration
    let config = AuthClientConfig::from_env()?;
    let email = std::env::var("BARGUNI_EMAIL").unwrap_or_else(|_| "test@example.com".to_string());
    let refresh_token = std::env::var("BARGUNI_REFRESH_TOKEN").unwrap_or_default();
    let search = std::env::var("BARGUNI_SEARCH").unwrap_or_else(|_| "milk".to_string());

    println!("=== Barguni Rust Client Example ===");
    println!("API: {}", config.base_url);
    println!("User: {}", email);
    println!();

    // Pre-login requests go through the plain client
    let plain = BarguniApi::new(PlainClient::new(config.clone())?);
    let access_token = plain.login(&email).await?;
    println!("✓ Logged in");

    // Everything else is authenticated and refreshes expired tokens on its own
    let session = Session::new(email.clone());
    let client = AuthClientHttp::new(config, MemoryCredentialStore::new(), session)?;
    client
        .establish(&SessionTokens::new(access_token, refresh_token))
        .await?;
    let api = BarguniApi::new(client);

    println!("Baskets:");
    for basket in api.baskets().await? {
        let code = api.join_code(basket.id).await?.unwrap_or_default();
        println!("  - {} (#{}) invite code: {}", basket.name, basket.id, code);
    }
    println!();

    println!("Items matching {:?}:", search);
    for item in api.search_items(&search).await? {
        println!(
            "  - {} [{}] until {}",
            item.name.unwrap_or_default(),
            item.category.unwrap_or_default(),
            item.shelf_life.unwrap_or_default()
        );
    }

    Ok(())
}
