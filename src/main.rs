#[macro_use]
extern crate rocket;

mod config;
mod error;
mod jwt;
mod models;
mod repository;
mod services;

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::{json::Json, Deserialize, Serialize};
use rocket::{Request, Response, State};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use config::mongo_config::setup_mongo;
use config::AppConfig;
use error::ExchangeError;
use jwt::guards::{AdminUser, AuthenticatedUser};
use jwt::jwt_helper;
use models::item::{Item, ItemStatus};
use models::notification::ExchangeRequest;
use models::user::User;
use repository::item_repository::ItemRepository;
use repository::notification_repository::NotificationRepository;
use repository::traits::{ItemStore, UserStore};
use repository::user_repository::UserRepository;
use services::email_service::{LogMailer, Mailer, SmtpMailer};
use services::exchange_service::{ExchangeService, RespondOutcome};

// CORS fairing tanımı
pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));
    }
}

// CORS OPTIONS route'u
#[options("/<path..>")]
fn all_options(path: std::path::PathBuf) -> Status {
    let _ = path;
    Status::Ok
}

// API yanıt şeması
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub message: String,
    pub result: Option<T>,
}

fn error_response<T>(err: ExchangeError) -> (Status, Json<ApiResponse<T>>) {
    if let ExchangeError::Storage(storage_err) = &err {
        error!("storage error: {:?}", storage_err);
    }
    let status = err.status();
    (
        status,
        Json(ApiResponse {
            message: format!("{}: {} - {}", status.code, status.reason_lossy(), err),
            result: None,
        }),
    )
}

fn internal_error<T>(message: &str) -> (Status, Json<ApiResponse<T>>) {
    (
        Status::InternalServerError,
        Json(ApiResponse {
            message: format!("500: Internal Server Error - {}", message),
            result: None,
        }),
    )
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
}

// Kayıt: e-posta ve kullanıcı adı benzersiz olmalı, parola argon2 ile özetlenir
#[post("/signup", format = "json", data = "<signup_data>")]
async fn signup(
    user_repo: &State<UserRepository>,
    app_config: &State<AppConfig>,
    signup_data: Json<SignupRequest>,
) -> (Status, Json<ApiResponse<AuthResponse>>) {
    let signup_data = signup_data.into_inner();
    if signup_data.username.is_empty() || signup_data.email.is_empty() || signup_data.password.is_empty() {
        return (
            Status::BadRequest,
            Json(ApiResponse {
                message: "400: Bad Request - username, email and password are required".to_string(),
                result: None,
            }),
        );
    }

    match user_repo.find_user_by_email(&signup_data.email).await {
        Ok(Some(_)) => {
            return (
                Status::BadRequest,
                Json(ApiResponse {
                    message: "400: Bad Request - Email already registered".to_string(),
                    result: None,
                }),
            )
        }
        Ok(None) => {}
        Err(err) => return error_response(err),
    }
    match user_repo.find_user_by_username(&signup_data.username).await {
        Ok(Some(_)) => {
            return (
                Status::BadRequest,
                Json(ApiResponse {
                    message: "400: Bad Request - Username already taken".to_string(),
                    result: None,
                }),
            )
        }
        Ok(None) => {}
        Err(err) => return error_response(err),
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = match Argon2::default().hash_password(signup_data.password.as_bytes(), &salt) {
        Ok(hash) => hash.to_string(),
        Err(err) => {
            error!("password hashing failed: {:?}", err);
            return internal_error("could not hash password");
        }
    };

    let user = User::new(
        signup_data.username,
        signup_data.email,
        password_hash,
        Utc::now().timestamp(),
    );
    if let Err(err) = user_repo.insert_user(&user).await {
        return error_response(err);
    }

    match jwt_helper::create_token(&user.id, user.role(), app_config.jwt_secret.as_bytes()) {
        Ok(token) => (
            Status::Created,
            Json(ApiResponse {
                message: "201: Created - User registered successfully".to_string(),
                result: Some(AuthResponse { token, user_id: user.id }),
            }),
        ),
        Err(err) => {
            error!("token creation failed: {:?}", err);
            internal_error("could not create token")
        }
    }
}

#[post("/login", format = "json", data = "<login_data>")]
async fn login(
    user_repo: &State<UserRepository>,
    app_config: &State<AppConfig>,
    login_data: Json<LoginRequest>,
) -> (Status, Json<ApiResponse<AuthResponse>>) {
    let login_data = login_data.into_inner();

    // E-posta varsa onunla, yoksa kullanıcı adıyla aranır
    let lookup = match (&login_data.email, &login_data.username) {
        (Some(email), _) => user_repo.find_user_by_email(email).await,
        (None, Some(username)) => user_repo.find_user_by_username(username).await,
        (None, None) => {
            return (
                Status::BadRequest,
                Json(ApiResponse {
                    message: "400: Bad Request - username or email is required".to_string(),
                    result: None,
                }),
            )
        }
    };

    let user = match lookup {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                Status::NotFound,
                Json(ApiResponse {
                    message: "404: Not Found - User not found".to_string(),
                    result: None,
                }),
            )
        }
        Err(err) => return error_response(err),
    };

    let parsed_hash = match PasswordHash::new(&user.password_hash) {
        Ok(hash) => hash,
        Err(err) => {
            error!("stored password hash is invalid for {}: {:?}", user.id, err);
            return internal_error("could not verify password");
        }
    };
    if Argon2::default()
        .verify_password(login_data.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return (
            Status::Unauthorized,
            Json(ApiResponse {
                message: "401: Unauthorized - Incorrect password".to_string(),
                result: None,
            }),
        );
    }

    match jwt_helper::create_token(&user.id, user.role(), app_config.jwt_secret.as_bytes()) {
        Ok(token) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success - Login successful".to_string(),
                result: Some(AuthResponse { token, user_id: user.id }),
            }),
        ),
        Err(err) => {
            error!("token creation failed: {:?}", err);
            internal_error("could not create token")
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub points: i64,
    pub reputation: i32,
    pub buy_history: Vec<String>,
    pub sell_history: Vec<String>,
    pub premium_status: bool,
    pub listing_number: i32,
    pub created_at: i64,
}

// Kendi profili; parola özeti yanıtta taşınmaz
#[get("/me")]
async fn me(
    auth: AuthenticatedUser,
    user_repo: &State<UserRepository>,
) -> (Status, Json<ApiResponse<ProfileResponse>>) {
    match user_repo.find_user(&auth.user_id).await {
        Ok(Some(user)) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(ProfileResponse {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                    points: user.points,
                    reputation: user.reputation,
                    buy_history: user.buy_history,
                    sell_history: user.sell_history,
                    premium_status: user.premium_status,
                    listing_number: user.listing_number,
                    created_at: user.created_at,
                }),
            }),
        ),
        Ok(None) => (
            Status::NotFound,
            Json(ApiResponse {
                message: "404: Not Found - User not found".to_string(),
                result: None,
            }),
        ),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateItemRequest {
    pub name: String,
    pub description: String,
    pub condition: String,
    pub category: String,
    pub price: i64,
    pub image1url: String,
    pub image2url: Option<String>,
    pub image3url: Option<String>,
    pub image4url: Option<String>,
}

// Yeni ilan; admin onayına kadar listelenmez
#[post("/items", format = "json", data = "<item_data>")]
async fn create_item(
    auth: AuthenticatedUser,
    item_repo: &State<ItemRepository>,
    user_repo: &State<UserRepository>,
    item_data: Json<CreateItemRequest>,
) -> (Status, Json<ApiResponse<Item>>) {
    let item_data = item_data.into_inner();
    if item_data.name.is_empty() || item_data.price < 0 {
        return (
            Status::BadRequest,
            Json(ApiResponse {
                message: "400: Bad Request - name is required and price cannot be negative".to_string(),
                result: None,
            }),
        );
    }

    let item = Item {
        id: Uuid::new_v4().to_string(),
        name: item_data.name,
        description: item_data.description,
        condition: item_data.condition,
        category: item_data.category,
        price: item_data.price,
        status: ItemStatus::Available,
        approved: false,
        uploader_id: auth.user_id.clone(),
        pending_request_id: None,
        image1url: item_data.image1url,
        image2url: item_data.image2url,
        image3url: item_data.image3url,
        image4url: item_data.image4url,
        created_at: Utc::now().timestamp(),
    };
    if let Err(err) = item_repo.insert_item(&item).await {
        return error_response(err);
    }
    if let Err(err) = user_repo.bump_listing_number(&auth.user_id).await {
        error!("could not bump listing number for {}: {:?}", auth.user_id, err);
    }

    (
        Status::Created,
        Json(ApiResponse {
            message: "201: Created - Item submitted for review".to_string(),
            result: Some(item),
        }),
    )
}

// Onaylanmış ve satın alınabilir ilanlar
#[get("/items")]
async fn get_all_items(item_repo: &State<ItemRepository>) -> (Status, Json<ApiResponse<Vec<Item>>>) {
    match item_repo.list_available().await {
        Ok(items) if !items.is_empty() => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(items),
            }),
        ),
        Ok(_) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success - No items listed".to_string(),
                result: Some(vec![]),
            }),
        ),
        Err(err) => error_response(err),
    }
}

#[get("/items/<item_id>")]
async fn get_item(
    item_repo: &State<ItemRepository>,
    item_id: &str,
) -> (Status, Json<ApiResponse<Item>>) {
    match item_repo.find_item(item_id).await {
        Ok(Some(item)) if item.approved => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(item),
            }),
        ),
        Ok(_) => (
            Status::NotFound,
            Json(ApiResponse {
                message: "404: Not Found - Item not found".to_string(),
                result: None,
            }),
        ),
        Err(err) => error_response(err),
    }
}

// Satın alma isteği açar; puanlar ancak sahip onaylarsa hareket eder
#[post("/buy_item/<item_id>")]
async fn buy_item(
    auth: AuthenticatedUser,
    exchange: &State<ExchangeService>,
    item_id: &str,
) -> (Status, Json<ApiResponse<ExchangeRequest>>) {
    match exchange.open_purchase(&auth.user_id, item_id).await {
        Ok(request) => (
            Status::Ok,
            Json(ApiResponse {
                message: "Purchase request sent to the item owner".to_string(),
                result: Some(request),
            }),
        ),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SwapRequestBody {
    pub offered_item_id: String,
}

#[post("/swap_item/<item_id>", format = "json", data = "<swap_data>")]
async fn swap_item(
    auth: AuthenticatedUser,
    exchange: &State<ExchangeService>,
    item_id: &str,
    swap_data: Json<SwapRequestBody>,
) -> (Status, Json<ApiResponse<ExchangeRequest>>) {
    match exchange
        .open_swap(&auth.user_id, item_id, &swap_data.offered_item_id)
        .await
    {
        Ok(request) => (
            Status::Ok,
            Json(ApiResponse {
                message: "Swap request sent to the item owner".to_string(),
                result: Some(request),
            }),
        ),
        Err(err) => error_response(err),
    }
}

// Kullanıcıya sahip olarak düşen istekler, yeniden eskiye
#[get("/notifications/purchase_requests")]
async fn get_purchase_requests(
    auth: AuthenticatedUser,
    exchange: &State<ExchangeService>,
) -> (Status, Json<ApiResponse<Vec<ExchangeRequest>>>) {
    match exchange.notifications_for(&auth.user_id).await {
        Ok(requests) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(requests),
            }),
        ),
        Err(err) => error_response(err),
    }
}

#[post("/notifications/purchase_requests/<request_id>/respond?<approve>")]
async fn respond_purchase_request(
    auth: AuthenticatedUser,
    exchange: &State<ExchangeService>,
    request_id: &str,
    approve: bool,
) -> (Status, Json<ApiResponse<String>>) {
    match exchange.respond(request_id, &auth.user_id, approve).await {
        Ok(RespondOutcome::Approved) => (
            Status::Ok,
            Json(ApiResponse {
                message: "Request approved, exchange completed".to_string(),
                result: None,
            }),
        ),
        Ok(RespondOutcome::Disapproved) => (
            Status::Ok,
            Json(ApiResponse {
                message: "Request declined".to_string(),
                result: None,
            }),
        ),
        Err(err) => error_response(err),
    }
}

#[post("/notifications/purchase_requests/<request_id>/read")]
async fn mark_request_read(
    auth: AuthenticatedUser,
    exchange: &State<ExchangeService>,
    request_id: &str,
) -> (Status, Json<ApiResponse<String>>) {
    match exchange.mark_read(request_id, &auth.user_id).await {
        Ok(()) => (
            Status::Ok,
            Json(ApiResponse {
                message: "Notification marked as read".to_string(),
                result: None,
            }),
        ),
        Err(err) => error_response(err),
    }
}

// Admin: onay bekleyen ilanlar
#[get("/admin/items/pending")]
async fn admin_pending_items(
    _admin: AdminUser,
    item_repo: &State<ItemRepository>,
) -> (Status, Json<ApiResponse<Vec<Item>>>) {
    match item_repo.list_pending_review().await {
        Ok(items) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(items),
            }),
        ),
        Err(err) => error_response(err),
    }
}

// Admin: onayla ya da reddet; ret ilanı kaldırır
#[post("/admin/items/<item_id>/review?<approve>")]
async fn admin_review_item(
    _admin: AdminUser,
    item_repo: &State<ItemRepository>,
    item_id: &str,
    approve: bool,
) -> (Status, Json<ApiResponse<String>>) {
    let result = if approve {
        item_repo.set_approved(item_id).await
    } else {
        item_repo.delete_item(item_id).await
    };
    match result {
        Ok(true) => (
            Status::Ok,
            Json(ApiResponse {
                message: if approve {
                    "Item approved and published".to_string()
                } else {
                    "Item rejected and removed".to_string()
                },
                result: None,
            }),
        ),
        Ok(false) => (
            Status::NotFound,
            Json(ApiResponse {
                message: "404: Not Found - No item awaiting review with that id".to_string(),
                result: None,
            }),
        ),
        Err(err) => error_response(err),
    }
}

// 404 Yakalama
#[catch(404)]
fn not_found(req: &Request) -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        message: format!("404: '{}' route not found", req.uri()),
        result: None,
    })
}

#[launch]
async fn rocket() -> _ {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app_config = AppConfig::from_env();
    let client = setup_mongo(&app_config)
        .await
        .expect("MongoDB connection failed");

    let user_repo = UserRepository::new(&client, &app_config.db_name);
    let item_repo = ItemRepository::new(&client, &app_config.db_name);
    let notification_repo = NotificationRepository::new(&client, &app_config.db_name);

    // SMTP ayarı yoksa gönderimler sadece loglanır
    let mailer: Arc<dyn Mailer> = match &app_config.smtp {
        Some(smtp) => match SmtpMailer::new(smtp) {
            Ok(smtp_mailer) => Arc::new(smtp_mailer),
            Err(err) => {
                warn!("SMTP mailer could not be created, falling back to logs: {:?}", err);
                Arc::new(LogMailer)
            }
        },
        None => Arc::new(LogMailer),
    };

    let exchange_service = ExchangeService::new(
        Arc::new(user_repo.clone()),
        Arc::new(item_repo.clone()),
        Arc::new(notification_repo.clone()),
        mailer,
    );

    rocket::build()
        .manage(app_config)
        .manage(user_repo)
        .manage(item_repo)
        .manage(notification_repo)
        .manage(exchange_service)
        .attach(CORS)
        .mount("/", routes![
            all_options, // CORS için OPTIONS route
            signup,
            login,
            me,
            create_item,
            get_all_items,
            get_item,
            buy_item,
            swap_item,
            get_purchase_requests,
            respond_purchase_request,
            mark_request_read,
            admin_pending_items,
            admin_review_item,
        ])
        .register("/", catchers![not_found]) // 404 yakalayıcı
}
