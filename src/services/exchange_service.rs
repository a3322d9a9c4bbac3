use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::{ExchangeError, Result};
use crate::models::item::ItemStatus;
use crate::models::notification::{ExchangeRequest, RequestKind, RequestStatus};
use crate::models::user::HistoryKind;
use crate::repository::traits::{ItemStore, RequestStore, UserStore};
use crate::services::email_service::Mailer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondOutcome {
    Approved,
    Disapproved,
}

// Satın alma / takas isteklerinin açılması, cevaplanması ve onaylanan
// isteğin puan + sahiplik transferinin tek parça olarak yürütülmesi.
#[derive(Clone)]
pub struct ExchangeService {
    users: Arc<dyn UserStore>,
    items: Arc<dyn ItemStore>,
    requests: Arc<dyn RequestStore>,
    mailer: Arc<dyn Mailer>,
}

impl ExchangeService {
    pub fn new(
        users: Arc<dyn UserStore>,
        items: Arc<dyn ItemStore>,
        requests: Arc<dyn RequestStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        ExchangeService { users, items, requests, mailer }
    }

    pub async fn open_purchase(&self, requester_id: &str, item_id: &str) -> Result<ExchangeRequest> {
        let requester = self
            .users
            .find_user(requester_id)
            .await?
            .ok_or(ExchangeError::NotFound("user"))?;

        // Bakiye açılışta kontrol edilmez; onay anına kadar değişebilir,
        // belirleyici kontrol yürütme sırasındaki koşullu debit'tir
        let request_id = Uuid::new_v4().to_string();
        let item = match self.items.reserve_for_request(item_id, &request_id).await? {
            Some(item) => item,
            None => return Err(self.unavailable_error(item_id).await?),
        };
        if item.uploader_id == requester_id {
            self.items.release_reservation(item_id, &request_id).await?;
            return Err(ExchangeError::Forbidden("cannot request own item"));
        }

        let request = ExchangeRequest {
            id: request_id,
            kind: RequestKind::Purchase,
            owner_id: item.uploader_id.clone(),
            requester_id: requester_id.to_string(),
            target_item_id: item.id.clone(),
            offered_item_id: None,
            price_diff: 0,
            status: RequestStatus::Pending,
            read: false,
            created_at: Utc::now().timestamp(),
        };
        if let Err(err) = self.requests.insert_request(&request).await {
            // İstek kaydedilemediyse rezervasyon geri alınır
            if let Err(release_err) = self.items.release_reservation(item_id, &request.id).await {
                error!("failed to release reservation on {}: {:?}", item_id, release_err);
            }
            return Err(err);
        }

        self.notify(
            &request.owner_id,
            format!("New purchase request for {}", item.name),
            format!(
                "{} wants to buy {} for {} points.",
                requester.username, item.name, item.price
            ),
        )
        .await;
        Ok(request)
    }

    pub async fn open_swap(
        &self,
        requester_id: &str,
        target_item_id: &str,
        offered_item_id: &str,
    ) -> Result<ExchangeRequest> {
        if target_item_id == offered_item_id {
            return Err(ExchangeError::InvalidInput("cannot swap an item with itself"));
        }
        let requester = self
            .users
            .find_user(requester_id)
            .await?
            .ok_or(ExchangeError::NotFound("user"))?;

        let request_id = Uuid::new_v4().to_string();
        let target = match self.items.reserve_for_request(target_item_id, &request_id).await? {
            Some(item) => item,
            None => return Err(self.unavailable_error(target_item_id).await?),
        };
        if target.uploader_id == requester_id {
            self.items.release_reservation(target_item_id, &request_id).await?;
            return Err(ExchangeError::Forbidden("cannot request own item"));
        }

        // Teklif edilen parça da aynı istek adına rezerve edilir; onay
        // anında hala takas edilebilir olduğu böylece garanti olur
        let offered = match self.items.reserve_for_request(offered_item_id, &request_id).await? {
            Some(item) => item,
            None => {
                let err = self.unavailable_error(offered_item_id).await;
                self.items.release_reservation(target_item_id, &request_id).await?;
                return Err(err?);
            }
        };
        if offered.uploader_id != requester_id {
            self.items.release_reservation(offered_item_id, &request_id).await?;
            self.items.release_reservation(target_item_id, &request_id).await?;
            return Err(ExchangeError::Forbidden("offered item is not owned by requester"));
        }

        let request = ExchangeRequest {
            id: request_id,
            kind: RequestKind::Swap,
            owner_id: target.uploader_id.clone(),
            requester_id: requester_id.to_string(),
            target_item_id: target.id.clone(),
            offered_item_id: Some(offered.id.clone()),
            price_diff: target.price - offered.price, // Açılış anında dondurulur
            status: RequestStatus::Pending,
            read: false,
            created_at: Utc::now().timestamp(),
        };
        if let Err(err) = self.requests.insert_request(&request).await {
            if let Err(release_err) = self.items.release_reservation(&offered.id, &request.id).await {
                error!("failed to release reservation on {}: {:?}", offered.id, release_err);
            }
            if let Err(release_err) = self.items.release_reservation(&target.id, &request.id).await {
                error!("failed to release reservation on {}: {:?}", target.id, release_err);
            }
            return Err(err);
        }

        self.notify(
            &request.owner_id,
            format!("New swap request for {}", target.name),
            format!(
                "{} offers {} in exchange for {} (price difference: {} points).",
                requester.username, offered.name, target.name, request.price_diff
            ),
        )
        .await;
        Ok(request)
    }

    pub async fn respond(
        &self,
        request_id: &str,
        responder_id: &str,
        approve: bool,
    ) -> Result<RespondOutcome> {
        let request = self
            .requests
            .find_request(request_id)
            .await?
            .ok_or(ExchangeError::NotFound("request"))?;
        if request.owner_id != responder_id {
            return Err(ExchangeError::Forbidden("only the item owner may respond"));
        }
        if request.status != RequestStatus::Pending {
            return Err(ExchangeError::InvalidState("request already resolved"));
        }

        if !approve {
            if !self
                .requests
                .transition(request_id, RequestStatus::Pending, RequestStatus::Disapproved)
                .await?
            {
                return Err(ExchangeError::InvalidState("request already resolved"));
            }
            self.release_all(&request).await;
            self.notify(
                &request.requester_id,
                "Your exchange request was declined".to_string(),
                format!("The owner declined your request for item {}.", request.target_item_id),
            )
            .await;
            return Ok(RespondOutcome::Disapproved);
        }

        // Pending -> Approved geçişi yürütme kilididir; eşzamanlı iki
        // onaydan yalnızca biri transferi çalıştırabilir
        if !self
            .requests
            .transition(request_id, RequestStatus::Pending, RequestStatus::Approved)
            .await?
        {
            return Err(ExchangeError::InvalidState("request already resolved"));
        }

        let result = match request.kind {
            RequestKind::Purchase => self.execute_purchase(&request).await,
            RequestKind::Swap => self.execute_swap(&request).await,
        };

        match result {
            Ok(()) => {
                self.notify(
                    &request.requester_id,
                    "Your exchange request was approved".to_string(),
                    format!("Your request for item {} went through.", request.target_item_id),
                )
                .await;
                Ok(RespondOutcome::Approved)
            }
            Err(err) => {
                // Transfer tamamlanamadı; istek beklemeye geri alınır,
                // rezervasyonlar durduğu için onay sonra yinelenebilir
                match self
                    .requests
                    .transition(request_id, RequestStatus::Approved, RequestStatus::Pending)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => error!("could not reopen request {}", request_id),
                    Err(reopen_err) => {
                        error!("could not reopen request {}: {:?}", request_id, reopen_err)
                    }
                }
                Err(err)
            }
        }
    }

    pub async fn notifications_for(&self, owner_id: &str) -> Result<Vec<ExchangeRequest>> {
        self.requests.list_for_owner(owner_id).await
    }

    pub async fn mark_read(&self, request_id: &str, owner_id: &str) -> Result<()> {
        if self.requests.mark_read(request_id, owner_id).await? {
            Ok(())
        } else {
            Err(ExchangeError::NotFound("request"))
        }
    }

    // Alıcıdan düş, satıcıya ekle, sahipliği çevir, geçmişleri yaz.
    // Puan hareketi sahiplik değişiminden önce gelir; her adımın telafisi
    // ters sırada uygulanır
    async fn execute_purchase(&self, request: &ExchangeRequest) -> Result<()> {
        // Satın almada fiyat onay anında okunur
        let item = self
            .items
            .find_item(&request.target_item_id)
            .await?
            .ok_or(ExchangeError::NotFound("item"))?;
        let price = item.price;

        if price > 0 {
            if !self.users.debit(&request.requester_id, price).await? {
                return Err(ExchangeError::InsufficientFunds);
            }
            if let Err(err) = self.users.credit(&request.owner_id, price).await {
                self.refund(&request.requester_id, price).await;
                return Err(err);
            }
        }
        if let Err(err) = self
            .items
            .transfer(&item.id, &request.requester_id, ItemStatus::Sold)
            .await
        {
            if price > 0 {
                self.claw_back(&request.owner_id, price).await;
                self.refund(&request.requester_id, price).await;
            }
            return Err(err);
        }

        self.append_history_logged(&request.requester_id, HistoryKind::Buy, &item.id).await;
        self.append_history_logged(&request.owner_id, HistoryKind::Sell, &item.id).await;
        Ok(())
    }

    async fn execute_swap(&self, request: &ExchangeRequest) -> Result<()> {
        let offered_item_id = request
            .offered_item_id
            .as_deref()
            .ok_or(ExchangeError::InvalidState("swap request without offered item"))?;
        let diff = request.price_diff;

        // Pozitif fark isteyen taraftan tahsil edilir; negatif fark için
        // geri ödeme yapılmaz
        if diff > 0 {
            if !self.users.debit(&request.requester_id, diff).await? {
                return Err(ExchangeError::InsufficientFunds);
            }
            if let Err(err) = self.users.credit(&request.owner_id, diff).await {
                self.refund(&request.requester_id, diff).await;
                return Err(err);
            }
        }

        if let Err(err) = self
            .items
            .transfer(&request.target_item_id, &request.requester_id, ItemStatus::Swapped)
            .await
        {
            if diff > 0 {
                self.claw_back(&request.owner_id, diff).await;
                self.refund(&request.requester_id, diff).await;
            }
            return Err(err);
        }
        if let Err(err) = self
            .items
            .transfer(offered_item_id, &request.owner_id, ItemStatus::Swapped)
            .await
        {
            // İlk transferi geri sar; geri dönen parça rezervasyonsuz kalır
            if let Err(undo_err) = self
                .items
                .transfer(&request.target_item_id, &request.owner_id, ItemStatus::Available)
                .await
            {
                error!("inconsistent swap state for request {}: {:?}", request.id, undo_err);
            }
            if diff > 0 {
                self.claw_back(&request.owner_id, diff).await;
                self.refund(&request.requester_id, diff).await;
            }
            return Err(err);
        }

        self.append_history_logged(&request.requester_id, HistoryKind::Buy, &request.target_item_id).await;
        self.append_history_logged(&request.requester_id, HistoryKind::Sell, offered_item_id).await;
        self.append_history_logged(&request.owner_id, HistoryKind::Sell, &request.target_item_id).await;
        self.append_history_logged(&request.owner_id, HistoryKind::Buy, offered_item_id).await;
        Ok(())
    }

    async fn unavailable_error(&self, item_id: &str) -> Result<ExchangeError> {
        Ok(match self.items.find_item(item_id).await? {
            None => ExchangeError::NotFound("item"),
            Some(_) => ExchangeError::InvalidState("item is not available"),
        })
    }

    async fn release_all(&self, request: &ExchangeRequest) {
        if let Err(err) = self
            .items
            .release_reservation(&request.target_item_id, &request.id)
            .await
        {
            error!("failed to release reservation on {}: {:?}", request.target_item_id, err);
        }
        if let Some(offered_id) = &request.offered_item_id {
            if let Err(err) = self.items.release_reservation(offered_id, &request.id).await {
                error!("failed to release reservation on {}: {:?}", offered_id, err);
            }
        }
    }

    async fn refund(&self, user_id: &str, amount: i64) {
        if let Err(err) = self.users.credit(user_id, amount).await {
            error!("compensation failed, {} points owed to {}: {:?}", amount, user_id, err);
        }
    }

    async fn claw_back(&self, user_id: &str, amount: i64) {
        match self.users.debit(user_id, amount).await {
            Ok(true) => {}
            Ok(false) => {
                error!("compensation failed, could not take back {} points from {}", amount, user_id)
            }
            Err(err) => error!(
                "compensation failed, could not take back {} points from {}: {:?}",
                amount, user_id, err
            ),
        }
    }

    async fn append_history_logged(&self, user_id: &str, kind: HistoryKind, item_id: &str) {
        if let Err(err) = self.users.append_history(user_id, kind, item_id).await {
            error!("failed to append {:?} history for {}: {:?}", kind, user_id, err);
        }
    }

    async fn notify(&self, user_id: &str, subject: String, body: String) {
        let user = match self.users.find_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("notification recipient {} not found", user_id);
                return;
            }
            Err(err) => {
                warn!("could not load notification recipient {}: {:?}", user_id, err);
                return;
            }
        };
        let mailer = self.mailer.clone();
        // E-posta gönderimi çekirdek işlemi asla bloklamaz
        tokio::task::spawn_blocking(move || {
            if let Err(err) = mailer.send(&user.email, &subject, &body) {
                warn!("notification email to {} failed: {:?}", user.email, err);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::Item;
    use crate::models::user::User;
    use crate::repository::memory::MemoryStore;
    use crate::services::email_service::LogMailer;

    fn service_with_store() -> (ExchangeService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let service = ExchangeService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(LogMailer),
        );
        (service, store)
    }

    async fn seed_user(store: &MemoryStore, name: &str, points: i64) -> User {
        let mut user = User::new(
            name.to_string(),
            format!("{name}@example.com"),
            "hash".to_string(),
            0,
        );
        user.points = points;
        store.insert_user(&user).await.unwrap();
        user
    }

    async fn seed_item(store: &MemoryStore, owner: &User, name: &str, price: i64) -> Item {
        let item = Item {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: "seeded".to_string(),
            condition: "good".to_string(),
            category: "clothing".to_string(),
            price,
            status: ItemStatus::Available,
            approved: true,
            uploader_id: owner.id.clone(),
            pending_request_id: None,
            image1url: "https://img.example/1.jpg".to_string(),
            image2url: None,
            image3url: None,
            image4url: None,
            created_at: 0,
        };
        store.insert_item(&item).await.unwrap();
        item
    }

    #[tokio::test]
    async fn purchase_moves_points_ownership_and_history() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 0).await;
        let buyer = seed_user(&store, "buyer", 100).await;
        let item = seed_item(&store, &seller, "Blue Denim Jacket", 60).await;

        let request = service.open_purchase(&buyer.id, &item.id).await.unwrap();
        let outcome = service.respond(&request.id, &seller.id, true).await.unwrap();
        assert_eq!(outcome, RespondOutcome::Approved);

        let buyer = store.find_user(&buyer.id).await.unwrap().unwrap();
        let seller = store.find_user(&seller.id).await.unwrap().unwrap();
        let item = store.find_item(&item.id).await.unwrap().unwrap();
        assert_eq!(buyer.points, 40);
        assert_eq!(seller.points, 60);
        assert_eq!(item.status, ItemStatus::Sold);
        assert_eq!(item.uploader_id, buyer.id);
        assert_eq!(buyer.buy_history, vec![item.id.clone()]);
        assert_eq!(seller.sell_history, vec![item.id.clone()]);

        let request = store.find_request(&request.id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn concurrent_debits_never_go_negative() {
        let (_, store) = service_with_store();
        let user = seed_user(&store, "spender", 100).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            let user_id = user.id.clone();
            handles.push(tokio::spawn(async move {
                store.debit(&user_id, 30).await.unwrap()
            }));
        }
        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        let user = store.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(successes, 3);
        assert_eq!(user.points, 10);
        assert!(user.points >= 0);
    }

    #[tokio::test]
    async fn concurrent_buyers_race_for_one_item() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 0).await;
        let first = seed_user(&store, "first", 100).await;
        let second = seed_user(&store, "second", 100).await;
        let item = seed_item(&store, &seller, "Black Sneakers", 40).await;

        let a = {
            let service = service.clone();
            let buyer = first.id.clone();
            let item = item.id.clone();
            tokio::spawn(async move { service.open_purchase(&buyer, &item).await })
        };
        let b = {
            let service = service.clone();
            let buyer = second.id.clone();
            let item = item.id.clone();
            tokio::spawn(async move { service.open_purchase(&buyer, &item).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser.as_ref().unwrap_err(),
            ExchangeError::InvalidState(_)
        ));
    }

    #[tokio::test]
    async fn open_on_missing_or_unapproved_item_fails() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 0).await;
        let buyer = seed_user(&store, "buyer", 100).await;

        let err = service.open_purchase(&buyer.id, "no-such-item").await.unwrap_err();
        assert!(matches!(err, ExchangeError::NotFound("item")));

        let mut item = seed_item(&store, &seller, "Unreviewed Coat", 10).await;
        item.approved = false;
        store.insert_item(&item).await.unwrap();
        let err = service.open_purchase(&buyer.id, &item.id).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidState(_)));
    }

    #[tokio::test]
    async fn sold_item_cannot_be_requested_again() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 0).await;
        let buyer = seed_user(&store, "buyer", 100).await;
        let late = seed_user(&store, "late", 100).await;
        let item = seed_item(&store, &seller, "Red Hoodie", 25).await;

        let request = service.open_purchase(&buyer.id, &item.id).await.unwrap();
        service.respond(&request.id, &seller.id, true).await.unwrap();

        let err = service.open_purchase(&late.id, &item.id).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidState(_)));
        assert!(store.get_available(&item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn only_one_pending_request_per_item() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 0).await;
        let first = seed_user(&store, "first", 100).await;
        let second = seed_user(&store, "second", 100).await;
        let item = seed_item(&store, &seller, "White T-shirt", 15).await;

        service.open_purchase(&first.id, &item.id).await.unwrap();
        let err = service.open_purchase(&second.id, &item.id).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidState(_)));
    }

    #[tokio::test]
    async fn rejection_releases_the_item_for_new_requests() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 0).await;
        let first = seed_user(&store, "first", 100).await;
        let second = seed_user(&store, "second", 100).await;
        let item = seed_item(&store, &seller, "Green T-shirt", 15).await;

        let request = service.open_purchase(&first.id, &item.id).await.unwrap();
        let outcome = service.respond(&request.id, &seller.id, false).await.unwrap();
        assert_eq!(outcome, RespondOutcome::Disapproved);

        // Reddedilen istek parçayı serbest bırakır, ikinci alıcı açabilir
        service.open_purchase(&second.id, &item.id).await.unwrap();

        let request = store.find_request(&request.id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Disapproved);
    }

    #[tokio::test]
    async fn request_can_be_answered_exactly_once() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 0).await;
        let buyer = seed_user(&store, "buyer", 100).await;
        let item = seed_item(&store, &seller, "Wool Scarf", 20).await;

        let request = service.open_purchase(&buyer.id, &item.id).await.unwrap();
        service.respond(&request.id, &seller.id, false).await.unwrap();
        let err = service.respond(&request.id, &seller.id, true).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidState(_)));
    }

    #[tokio::test]
    async fn only_the_owner_may_respond() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 0).await;
        let buyer = seed_user(&store, "buyer", 100).await;
        let item = seed_item(&store, &seller, "Leather Belt", 10).await;

        let request = service.open_purchase(&buyer.id, &item.id).await.unwrap();
        let err = service.respond(&request.id, &buyer.id, true).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Forbidden(_)));
    }

    #[tokio::test]
    async fn own_item_cannot_be_requested_and_stays_free() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 100).await;
        let buyer = seed_user(&store, "buyer", 100).await;
        let item = seed_item(&store, &seller, "Denim Shorts", 10).await;

        let err = service.open_purchase(&seller.id, &item.id).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Forbidden(_)));

        // Rezervasyon geri alındı, başka alıcı isteyebilir
        service.open_purchase(&buyer.id, &item.id).await.unwrap();
    }

    #[tokio::test]
    async fn underfunded_purchase_fails_and_changes_nothing() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 5).await;
        let buyer = seed_user(&store, "buyer", 10).await;
        let item = seed_item(&store, &seller, "Silk Dress", 60).await;

        let request = service.open_purchase(&buyer.id, &item.id).await.unwrap();
        let err = service.respond(&request.id, &seller.id, true).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InsufficientFunds));

        let buyer_after = store.find_user(&buyer.id).await.unwrap().unwrap();
        let seller_after = store.find_user(&seller.id).await.unwrap().unwrap();
        let item_after = store.find_item(&item.id).await.unwrap().unwrap();
        assert_eq!(buyer_after.points, 10);
        assert_eq!(seller_after.points, 5);
        assert_eq!(item_after.status, ItemStatus::Available);
        assert_eq!(item_after.uploader_id, seller.id);

        // İstek beklemeye geri döner; bakiye tamamlanınca onay yinelenebilir
        let request_after = store.find_request(&request.id).await.unwrap().unwrap();
        assert_eq!(request_after.status, RequestStatus::Pending);
        store.credit(&buyer.id, 50).await.unwrap();
        let outcome = service.respond(&request.id, &seller.id, true).await.unwrap();
        assert_eq!(outcome, RespondOutcome::Approved);
    }

    #[tokio::test]
    async fn swap_with_positive_diff_settles_points_and_crosses_items() {
        let (service, store) = service_with_store();
        let owner = seed_user(&store, "owner", 0).await;
        let requester = seed_user(&store, "requester", 20).await;
        let target = seed_item(&store, &owner, "Blue Denim Jacket", 40).await;
        let offered = seed_item(&store, &requester, "Red Hoodie", 25).await;

        let request = service
            .open_swap(&requester.id, &target.id, &offered.id)
            .await
            .unwrap();
        assert_eq!(request.price_diff, 15);

        let outcome = service.respond(&request.id, &owner.id, true).await.unwrap();
        assert_eq!(outcome, RespondOutcome::Approved);

        let owner_after = store.find_user(&owner.id).await.unwrap().unwrap();
        let requester_after = store.find_user(&requester.id).await.unwrap().unwrap();
        assert_eq!(requester_after.points, 5);
        assert_eq!(owner_after.points, 15);

        let target_after = store.find_item(&target.id).await.unwrap().unwrap();
        let offered_after = store.find_item(&offered.id).await.unwrap().unwrap();
        assert_eq!(target_after.status, ItemStatus::Swapped);
        assert_eq!(offered_after.status, ItemStatus::Swapped);
        assert_eq!(target_after.uploader_id, requester.id);
        assert_eq!(offered_after.uploader_id, owner.id);

        assert_eq!(requester_after.buy_history, vec![target.id.clone()]);
        assert_eq!(requester_after.sell_history, vec![offered.id.clone()]);
        assert_eq!(owner_after.sell_history, vec![target.id.clone()]);
        assert_eq!(owner_after.buy_history, vec![offered.id.clone()]);
    }

    #[tokio::test]
    async fn underfunded_swap_fails_and_items_stay_put() {
        let (service, store) = service_with_store();
        let owner = seed_user(&store, "owner", 0).await;
        let requester = seed_user(&store, "requester", 10).await;
        let target = seed_item(&store, &owner, "Winter Coat", 40).await;
        let offered = seed_item(&store, &requester, "Knit Beanie", 25).await;

        let request = service
            .open_swap(&requester.id, &target.id, &offered.id)
            .await
            .unwrap();
        assert_eq!(request.price_diff, 15);

        let err = service.respond(&request.id, &owner.id, true).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InsufficientFunds));

        let target_after = store.find_item(&target.id).await.unwrap().unwrap();
        let offered_after = store.find_item(&offered.id).await.unwrap().unwrap();
        assert_eq!(target_after.uploader_id, owner.id);
        assert_eq!(offered_after.uploader_id, requester.id);
        assert_eq!(target_after.status, ItemStatus::Available);
        assert_eq!(offered_after.status, ItemStatus::Available);

        let requester_after = store.find_user(&requester.id).await.unwrap().unwrap();
        let owner_after = store.find_user(&owner.id).await.unwrap().unwrap();
        assert_eq!(requester_after.points, 10);
        assert_eq!(owner_after.points, 0);
    }

    #[tokio::test]
    async fn negative_diff_swap_moves_no_points() {
        let (service, store) = service_with_store();
        let owner = seed_user(&store, "owner", 0).await;
        let requester = seed_user(&store, "requester", 0).await;
        let target = seed_item(&store, &owner, "Plain Cap", 20).await;
        let offered = seed_item(&store, &requester, "Designer Bag", 50).await;

        let request = service
            .open_swap(&requester.id, &target.id, &offered.id)
            .await
            .unwrap();
        assert_eq!(request.price_diff, -30);

        service.respond(&request.id, &owner.id, true).await.unwrap();

        // Negatif fark geri ödenmez, iki bakiye de olduğu gibi kalır
        let owner_after = store.find_user(&owner.id).await.unwrap().unwrap();
        let requester_after = store.find_user(&requester.id).await.unwrap().unwrap();
        assert_eq!(owner_after.points, 0);
        assert_eq!(requester_after.points, 0);

        let target_after = store.find_item(&target.id).await.unwrap().unwrap();
        assert_eq!(target_after.uploader_id, requester.id);
    }

    #[tokio::test]
    async fn swap_requires_owning_the_offered_item() {
        let (service, store) = service_with_store();
        let owner = seed_user(&store, "owner", 0).await;
        let requester = seed_user(&store, "requester", 0).await;
        let third = seed_user(&store, "third", 0).await;
        let target = seed_item(&store, &owner, "Corduroy Pants", 30).await;
        let not_mine = seed_item(&store, &third, "Suede Boots", 30).await;

        let err = service
            .open_swap(&requester.id, &target.id, &not_mine.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Forbidden(_)));

        // Her iki rezervasyon da geri alınmış olmalı
        let target_after = store.find_item(&target.id).await.unwrap().unwrap();
        let not_mine_after = store.find_item(&not_mine.id).await.unwrap().unwrap();
        assert!(target_after.pending_request_id.is_none());
        assert!(not_mine_after.pending_request_id.is_none());
    }

    #[tokio::test]
    async fn swap_with_itself_is_rejected() {
        let (service, store) = service_with_store();
        let requester = seed_user(&store, "requester", 0).await;
        let item = seed_item(&store, &requester, "Flannel Shirt", 10).await;

        let err = service
            .open_swap(&requester.id, &item.id, &item.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn status_flips_are_one_way_at_the_store() {
        let (_, store) = service_with_store();
        let owner = seed_user(&store, "owner", 0).await;
        let item = seed_item(&store, &owner, "Canvas Tote", 5).await;

        assert!(store.mark_status(&item.id, ItemStatus::Sold).await.unwrap());
        // Satılmış parçanın durumu bir daha değişmez
        assert!(!store.mark_status(&item.id, ItemStatus::Available).await.unwrap());
        assert!(!store.mark_status(&item.id, ItemStatus::Swapped).await.unwrap());
        assert!(store.get_available(&item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn notifications_are_listed_for_the_owner_and_marked_read() {
        let (service, store) = service_with_store();
        let seller = seed_user(&store, "seller", 0).await;
        let buyer = seed_user(&store, "buyer", 100).await;
        let item = seed_item(&store, &seller, "Puffer Vest", 35).await;

        let request = service.open_purchase(&buyer.id, &item.id).await.unwrap();

        let inbox = service.notifications_for(&seller.id).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert!(!inbox[0].read);
        assert!(service.notifications_for(&buyer.id).await.unwrap().is_empty());

        service.mark_read(&request.id, &seller.id).await.unwrap();
        let inbox = service.notifications_for(&seller.id).await.unwrap();
        assert!(inbox[0].read);

        // Yabancı kullanıcı okundu işaretleyemez
        let err = service.mark_read(&request.id, &buyer.id).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NotFound(_)));
    }
}
