use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Available,
    Sold,
    Swapped,
}

impl ItemStatus {
    // doc! filtrelerinde kullanılan string karşılığı
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "Available",
            ItemStatus::Sold => "Sold",
            ItemStatus::Swapped => "Swapped",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub condition: String,
    pub category: String,
    pub price: i64,
    pub status: ItemStatus, // Tek yönlü geçiş: Available -> Sold | Swapped
    pub approved: bool,     // Admin onayı olmadan listelenmez
    pub uploader_id: String, // Mevcut sahip
    pub pending_request_id: Option<String>, // Item başına tek bekleyen istek
    pub image1url: String,
    pub image2url: Option<String>,
    pub image3url: Option<String>,
    pub image4url: Option<String>,
    pub created_at: i64,
}

