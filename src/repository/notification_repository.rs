use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use mongodb::{Client, Collection};

use crate::error::Result;
use crate::models::notification::{ExchangeRequest, RequestStatus};
use crate::repository::traits::RequestStore;

#[derive(Clone)]
pub struct NotificationRepository {
    collection: Collection<ExchangeRequest>,
}

impl NotificationRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client
            .database(db_name)
            .collection::<ExchangeRequest>("notifications");
        NotificationRepository { collection }
    }
}

#[async_trait]
impl RequestStore for NotificationRepository {
    async fn insert_request(&self, request: &ExchangeRequest) -> Result<()> {
        self.collection.insert_one(request, None).await?;
        Ok(())
    }

    async fn find_request(&self, request_id: &str) -> Result<Option<ExchangeRequest>> {
        let filter = doc! { "id": request_id };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<ExchangeRequest>> {
        let filter = doc! { "owner_id": owner_id };
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let mut cursor = self.collection.find(filter, options).await?;
        let mut requests = Vec::new();
        while let Some(request) = cursor.try_next().await? {
            requests.push(request);
        }
        Ok(requests)
    }

    async fn transition(&self, request_id: &str, from: RequestStatus, to: RequestStatus) -> Result<bool> {
        // Koşullu geçiş: istek hala from durumundaysa kazanır. Aynı isteğe
        // ikinci cevap bu filtreye takılır
        let filter = doc! { "id": request_id, "status": from.as_str() };
        let update = doc! { "$set": { "status": to.as_str() } };
        let result = self.collection.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }

    async fn mark_read(&self, request_id: &str, owner_id: &str) -> Result<bool> {
        let filter = doc! { "id": request_id, "owner_id": owner_id };
        let update = doc! { "$set": { "read": true } };
        let result = self.collection.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }
}
