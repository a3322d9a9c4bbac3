use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::{Client, Collection};

use crate::error::Result;
use crate::models::user::{HistoryKind, User};
use crate::repository::traits::UserStore;

#[derive(Clone)]
pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection::<User>("users");
        UserRepository { collection }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert_user(&self, user: &User) -> Result<()> {
        self.collection.insert_one(user, None).await?;
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        let filter = doc! { "id": user_id };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let filter = doc! { "email": email };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let filter = doc! { "username": username };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn credit(&self, user_id: &str, amount: i64) -> Result<()> {
        let filter = doc! { "id": user_id };
        let update = doc! { "$inc": { "points": amount } };
        self.collection.update_one(filter, update, None).await?;
        Ok(())
    }

    async fn debit(&self, user_id: &str, amount: i64) -> Result<bool> {
        // Bakiye kontrolü ve düşme tek koşullu güncellemede; iki eşzamanlı
        // harcamanın bakiyeyi eksiye düşürmesi bu filtreyle engellenir
        let filter = doc! { "id": user_id, "points": { "$gte": amount } };
        let update = doc! { "$inc": { "points": -amount } };
        let result = self.collection.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }

    async fn append_history(&self, user_id: &str, kind: HistoryKind, item_id: &str) -> Result<()> {
        let filter = doc! { "id": user_id };
        let update = match kind {
            HistoryKind::Buy => doc! { "$push": { "buy_history": item_id } },
            HistoryKind::Sell => doc! { "$push": { "sell_history": item_id } },
        };
        self.collection.update_one(filter, update, None).await?;
        Ok(())
    }

    async fn bump_listing_number(&self, user_id: &str) -> Result<()> {
        let filter = doc! { "id": user_id };
        let update = doc! { "$inc": { "listing_number": 1 } };
        self.collection.update_one(filter, update, None).await?;
        Ok(())
    }
}
