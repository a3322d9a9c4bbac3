use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Kullanıcı ID'si
    pub role: String, // "user" | "admin"
    pub exp: usize,   // Son kullanma zamanı
}
