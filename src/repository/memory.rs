// Bellek içi depolama; testler Mongo olmadan aynı koşullu güncelleme
// semantiğiyle koşar. Her işlem tek kilit altında yapıldığı için koşullu
// güncellemeler Mongo'daki gibi atomiktir.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::item::{Item, ItemStatus};
use crate::models::notification::{ExchangeRequest, RequestStatus};
use crate::models::user::{HistoryKind, User};
use crate::repository::traits::{ItemStore, RequestStore, UserStore};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, User>>,
    items: Mutex<HashMap<String, Item>>,
    requests: Mutex<HashMap<String, ExchangeRequest>>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        self.users.lock().unwrap().insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn credit(&self, user_id: &str, amount: i64) -> Result<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
            user.points += amount;
        }
        Ok(())
    }

    async fn debit(&self, user_id: &str, amount: i64) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(user_id) {
            Some(user) if user.points >= amount => {
                user.points -= amount;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_history(&self, user_id: &str, kind: HistoryKind, item_id: &str) -> Result<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
            match kind {
                HistoryKind::Buy => user.buy_history.push(item_id.to_string()),
                HistoryKind::Sell => user.sell_history.push(item_id.to_string()),
            }
        }
        Ok(())
    }

    async fn bump_listing_number(&self, user_id: &str) -> Result<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
            user.listing_number += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn insert_item(&self, item: &Item) -> Result<()> {
        self.items.lock().unwrap().insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn find_item(&self, item_id: &str) -> Result<Option<Item>> {
        Ok(self.items.lock().unwrap().get(item_id).cloned())
    }

    async fn get_available(&self, item_id: &str) -> Result<Option<Item>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .get(item_id)
            .filter(|i| i.status == ItemStatus::Available && i.approved)
            .cloned())
    }

    async fn list_available(&self) -> Result<Vec<Item>> {
        let mut items: Vec<Item> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.status == ItemStatus::Available && i.approved)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn list_pending_review(&self) -> Result<Vec<Item>> {
        let mut items: Vec<Item> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| !i.approved)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    async fn set_approved(&self, item_id: &str) -> Result<bool> {
        match self.items.lock().unwrap().get_mut(item_id) {
            Some(item) if !item.approved => {
                item.approved = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_item(&self, item_id: &str) -> Result<bool> {
        Ok(self.items.lock().unwrap().remove(item_id).is_some())
    }

    async fn reserve_for_request(&self, item_id: &str, request_id: &str) -> Result<Option<Item>> {
        let mut items = self.items.lock().unwrap();
        match items.get_mut(item_id) {
            Some(item)
                if item.status == ItemStatus::Available
                    && item.approved
                    && item.pending_request_id.is_none() =>
            {
                item.pending_request_id = Some(request_id.to_string());
                Ok(Some(item.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_reservation(&self, item_id: &str, request_id: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items.get_mut(item_id) {
            if item.pending_request_id.as_deref() == Some(request_id) {
                item.pending_request_id = None;
            }
        }
        Ok(())
    }

    async fn mark_status(&self, item_id: &str, status: ItemStatus) -> Result<bool> {
        let mut items = self.items.lock().unwrap();
        match items.get_mut(item_id) {
            Some(item) if item.status == ItemStatus::Available => {
                item.status = status;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn transfer(&self, item_id: &str, new_owner_id: &str, new_status: ItemStatus) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items.get_mut(item_id) {
            item.uploader_id = new_owner_id.to_string();
            item.status = new_status;
            item.pending_request_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert_request(&self, request: &ExchangeRequest) -> Result<()> {
        self.requests
            .lock()
            .unwrap()
            .insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn find_request(&self, request_id: &str) -> Result<Option<ExchangeRequest>> {
        Ok(self.requests.lock().unwrap().get(request_id).cloned())
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<ExchangeRequest>> {
        let mut requests: Vec<ExchangeRequest> = self
            .requests
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn transition(&self, request_id: &str, from: RequestStatus, to: RequestStatus) -> Result<bool> {
        let mut requests = self.requests.lock().unwrap();
        match requests.get_mut(request_id) {
            Some(request) if request.status == from => {
                request.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_read(&self, request_id: &str, owner_id: &str) -> Result<bool> {
        let mut requests = self.requests.lock().unwrap();
        match requests.get_mut(request_id) {
            Some(request) if request.owner_id == owner_id => {
                request.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
