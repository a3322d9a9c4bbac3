use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Purchase,
    Swap,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Disapproved,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Disapproved => "Disapproved",
        }
    }
}

// Bir item sahibine düşen satın alma / takas isteği. Hiçbir zaman silinmez,
// çözümlendiğinde status alanı terminal değere geçer.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExchangeRequest {
    pub id: String,
    pub kind: RequestKind,
    pub owner_id: String,     // İsteği cevaplayacak taraf
    pub requester_id: String, // İsteği açan taraf
    pub target_item_id: String,
    pub offered_item_id: Option<String>, // Sadece takasta dolu
    pub price_diff: i64, // Takasta açılış anında dondurulur, satın almada 0
    pub status: RequestStatus,
    pub read: bool,
    pub created_at: i64,
}
