use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection};

use crate::error::Result;
use crate::models::item::{Item, ItemStatus};
use crate::repository::traits::ItemStore;

#[derive(Clone)]
pub struct ItemRepository {
    collection: Collection<Item>,
}

impl ItemRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection::<Item>("items");
        ItemRepository { collection }
    }
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn insert_item(&self, item: &Item) -> Result<()> {
        self.collection.insert_one(item, None).await?;
        Ok(())
    }

    async fn find_item(&self, item_id: &str) -> Result<Option<Item>> {
        let filter = doc! { "id": item_id };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn get_available(&self, item_id: &str) -> Result<Option<Item>> {
        let filter = doc! {
            "id": item_id,
            "status": ItemStatus::Available.as_str(),
            "approved": true,
        };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn list_available(&self) -> Result<Vec<Item>> {
        let filter = doc! {
            "status": ItemStatus::Available.as_str(),
            "approved": true,
        };
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let mut cursor = self.collection.find(filter, options).await?;
        let mut items = Vec::new();
        while let Some(item) = cursor.try_next().await? {
            items.push(item);
        }
        Ok(items)
    }

    async fn list_pending_review(&self) -> Result<Vec<Item>> {
        let filter = doc! { "approved": false };
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let mut cursor = self.collection.find(filter, options).await?;
        let mut items = Vec::new();
        while let Some(item) = cursor.try_next().await? {
            items.push(item);
        }
        Ok(items)
    }

    async fn set_approved(&self, item_id: &str) -> Result<bool> {
        let filter = doc! { "id": item_id, "approved": false };
        let update = doc! { "$set": { "approved": true } };
        let result = self.collection.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }

    async fn delete_item(&self, item_id: &str) -> Result<bool> {
        let filter = doc! { "id": item_id };
        let result = self.collection.delete_one(filter, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn reserve_for_request(&self, item_id: &str, request_id: &str) -> Result<Option<Item>> {
        // Uygunluk kontrolü ve rezervasyon tek koşullu güncellemede; iki
        // eşzamanlı istekten yalnızca biri bu filtreden geçer
        let filter = doc! {
            "id": item_id,
            "status": ItemStatus::Available.as_str(),
            "approved": true,
            "pending_request_id": Bson::Null,
        };
        let update = doc! { "$set": { "pending_request_id": request_id } };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self.collection.find_one_and_update(filter, update, options).await?)
    }

    async fn release_reservation(&self, item_id: &str, request_id: &str) -> Result<()> {
        let filter = doc! { "id": item_id, "pending_request_id": request_id };
        let update = doc! { "$set": { "pending_request_id": Bson::Null } };
        self.collection.update_one(filter, update, None).await?;
        Ok(())
    }

    async fn mark_status(&self, item_id: &str, status: ItemStatus) -> Result<bool> {
        let filter = doc! { "id": item_id, "status": ItemStatus::Available.as_str() };
        let update = doc! { "$set": { "status": status.as_str() } };
        let result = self.collection.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }

    async fn transfer(&self, item_id: &str, new_owner_id: &str, new_status: ItemStatus) -> Result<()> {
        let filter = doc! { "id": item_id };
        let update = doc! {
            "$set": {
                "uploader_id": new_owner_id,
                "status": new_status.as_str(),
                "pending_request_id": Bson::Null,
            }
        };
        self.collection.update_one(filter, update, None).await?;
        Ok(())
    }
}
