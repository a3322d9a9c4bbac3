pub mod mongo_config;

use std::env;

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub mongo_uri: String,
    pub db_name: String,
    pub jwt_secret: String,
    pub smtp: Option<SmtpConfig>, // SMTP ayarı yoksa e-postalar sadece loglanır
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mongo_uri =
            env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name = env::var("MONGO_DB_NAME").unwrap_or_else(|_| "rewear".to_string());
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string());

        let smtp = match (env::var("SMTP_HOST"), env::var("SMTP_USERNAME"), env::var("SMTP_PASSWORD"), env::var("SMTP_FROM")) {
            (Ok(host), Ok(username), Ok(password), Ok(from_email)) => {
                let port = env::var("SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(587);
                Some(SmtpConfig { host, port, username, password, from_email })
            }
            _ => None,
        };

        AppConfig { mongo_uri, db_name, jwt_secret, smtp }
    }
}
