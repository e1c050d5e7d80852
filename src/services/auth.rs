use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{models::users::User, repositories::user_repo::UserRepository, Error, Result};

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    jwt_secret: String,
    jwt_maxage: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: usize,
    exp: usize,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, jwt_secret: String, jwt_maxage: i64) -> Self {
        Self {
            user_repo,
            jwt_secret,
            jwt_maxage,
        }
    }

    /// The site has a single administrator: registration closes for good
    /// once the first account exists. The count is only a shortcut; the
    /// conditional insert decides.
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        if self.user_repo.count_users().await? > 0 {
            tracing::warn!(username, "Registration attempted after it was closed");
            return Err(Error::Forbidden);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();

        let Some(user) = self
            .user_repo
            .create_first_user(username, &password_hash)
            .await?
        else {
            tracing::warn!(username, "Lost the race for the administrator account");
            return Err(Error::Forbidden);
        };

        tracing::info!(user_id = %user.id, "Administrator registered");
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(Error::Unauthorized)?;

        let parsed_hash = PasswordHash::new(&user.password)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| Error::Unauthorized)?;

        self.generate_token(user.id)
    }

    fn generate_token(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let exp = (now + Duration::minutes(self.jwt_maxage)).timestamp() as usize;
        let iat = now.timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|err| {
            tracing::error!("Failed to sign token: {:?}", err);
            Error::InternalServerError
        })
    }

    /// Bad signatures, malformed tokens and expired tokens are all `Forbidden`.
    pub fn decode_token<T: Into<String>>(&self, token: T) -> Result<Uuid> {
        let decoded = decode::<Claims>(
            &token.into(),
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|err| {
            tracing::debug!("Rejected token: {}", err);
            Error::Forbidden
        })?;

        Uuid::parse_str(&decoded.claims.sub).map_err(|_| Error::Forbidden)
    }

    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = self.decode_token(token)?;
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(Error::Forbidden)
    }
}
