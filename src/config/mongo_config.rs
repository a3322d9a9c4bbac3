use mongodb::{options::ClientOptions, Client};

use crate::config::AppConfig;

pub async fn setup_mongo(config: &AppConfig) -> mongodb::error::Result<Client> {
    let mut client_options = ClientOptions::parse(&config.mongo_uri).await?;
    client_options.app_name = Some("rewear-backend".to_string());
    Client::with_options(client_options)
}
