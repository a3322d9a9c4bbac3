use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Puan hareketinin hangi geçmişe yazılacağını seçer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Buy,
    Sell,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub points: i64, // Puan bakiyesi, hiçbir zaman negatif olamaz
    pub reputation: i32,
    pub buy_history: Vec<String>,  // Satın alınan item id'leri, sıralı
    pub sell_history: Vec<String>, // Satılan item id'leri, sıralı
    pub premium_status: bool,
    pub listing_number: i32,
    pub is_admin: bool,
    pub created_at: i64, // Unix timestamp
}

impl User {
    pub fn new(username: String, email: String, password_hash: String, created_at: i64) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            points: 0,
            reputation: 0,
            buy_history: vec![],
            sell_history: vec![],
            premium_status: false,
            listing_number: 0,
            is_admin: false,
            created_at,
        }
    }

    pub fn role(&self) -> &'static str {
        if self.is_admin {
            "admin"
        } else {
            "user"
        }
    }
}
