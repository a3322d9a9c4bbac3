use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};

use crate::config::AppConfig;
use crate::jwt::jwt_helper;

// Bearer token'dan kimliği çıkaran request guard. Süresi dolmuş ya da
// bozuk token 401 ile reddedilir.
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match request.rocket().state::<AppConfig>() {
            Some(config) => config,
            None => return Outcome::Error((Status::InternalServerError, ())),
        };

        let token = request
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "));

        match token {
            Some(token) => match jwt_helper::verify_token(token, config.jwt_secret.as_bytes()) {
                Ok(claims) => Outcome::Success(AuthenticatedUser {
                    user_id: claims.sub,
                    role: claims.role,
                }),
                Err(_) => Outcome::Error((Status::Unauthorized, ())),
            },
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

// Admin yetkisi token'daki role claim'i ile taşınır, süreç genelinde
// paylaşılan bir admin token'ı yoktur.
pub struct AdminUser {
    pub user_id: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request.guard::<AuthenticatedUser>().await {
            Outcome::Success(auth) if auth.role == "admin" => {
                Outcome::Success(AdminUser { user_id: auth.user_id })
            }
            Outcome::Success(_) => Outcome::Error((Status::Forbidden, ())),
            Outcome::Error(error) => Outcome::Error(error),
            Outcome::Forward(forward) => Outcome::Forward(forward),
        }
    }
}
