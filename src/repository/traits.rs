use async_trait::async_trait;

use crate::error::Result;
use crate::models::item::{Item, ItemStatus};
use crate::models::notification::{ExchangeRequest, RequestStatus};
use crate::models::user::{HistoryKind, User};

// Depolama sözleşmeleri. Domain katmanı bu trait'ler üzerinden çalışır,
// Mongo gerçeklemeleri repository modüllerinde, testler bellek içi
// gerçeklemeyle koşar.

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn find_user(&self, user_id: &str) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    // Koşulsuz puan ekleme
    async fn credit(&self, user_id: &str, amount: i64) -> Result<()>;

    // Tek atomik koşullu güncelleme: bakiye yeterliyse düşer, değilse
    // false döner ve hiçbir değişiklik yapmaz
    async fn debit(&self, user_id: &str, amount: i64) -> Result<bool>;

    async fn append_history(&self, user_id: &str, kind: HistoryKind, item_id: &str) -> Result<()>;
    async fn bump_listing_number(&self, user_id: &str) -> Result<()>;
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn insert_item(&self, item: &Item) -> Result<()>;
    async fn find_item(&self, item_id: &str) -> Result<Option<Item>>;

    // Sadece status == Available ve approved == true ise döner
    async fn get_available(&self, item_id: &str) -> Result<Option<Item>>;
    async fn list_available(&self) -> Result<Vec<Item>>;
    async fn list_pending_review(&self) -> Result<Vec<Item>>;
    async fn set_approved(&self, item_id: &str) -> Result<bool>;
    async fn delete_item(&self, item_id: &str) -> Result<bool>;

    // Item başına tek bekleyen istek korunumu: Available + onaylı + boş
    // rezervasyon koşulu tek güncellemede denetlenir, kazanan isteğin
    // id'si yazılır
    async fn reserve_for_request(&self, item_id: &str, request_id: &str) -> Result<Option<Item>>;

    // Rezervasyonu yalnızca hala request_id'ye aitse temizler
    async fn release_reservation(&self, item_id: &str, request_id: &str) -> Result<()>;

    // Koşulsuz: çağıran sahiplik ve durumu rezervasyonla garantilemiş olmalı
    async fn transfer(&self, item_id: &str, new_owner_id: &str, new_status: ItemStatus) -> Result<()>;

    // Sahipliği değiştirmeden durum düşürür; tek yönlü geçişi korumak için
    // yalnızca Available durumundaki parçaya uygulanır
    async fn mark_status(&self, item_id: &str, status: ItemStatus) -> Result<bool>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert_request(&self, request: &ExchangeRequest) -> Result<()>;
    async fn find_request(&self, request_id: &str) -> Result<Option<ExchangeRequest>>;
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<ExchangeRequest>>;

    // Koşullu durum geçişi; from durumunda değilse false döner. Pending ->
    // Approved geçişi Executor'un yürütme kilididir
    async fn transition(&self, request_id: &str, from: RequestStatus, to: RequestStatus) -> Result<bool>;

    async fn mark_read(&self, request_id: &str, owner_id: &str) -> Result<bool>;
}
