use jsonwebtoken::{decode, encode, errors::Result as JwtResult, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::jwt::claims::Claims;

pub fn create_token(user_id: &str, role: &str, secret: &[u8]) -> JwtResult<String> {
    let my_claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: (SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 60 * 60 * 24) as usize, // 24 saat geçerlilik süresi
    };

    encode(&Header::default(), &my_claims, &EncodingKey::from_secret(secret))
}

pub fn verify_token(token: &str, secret: &[u8]) -> Result<Claims, String> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| "Invalid token".to_string())
}
