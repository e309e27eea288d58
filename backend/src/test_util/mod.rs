use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::auth::Claims;
use crate::config::{
    AuthConfig, BootstrapConfig, Config, CorsConfig, DatabaseConfig, LoggingConfig, ServerConfig,
};
use crate::models::{NewUser, User};
use crate::store::Database;
use crate::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-do-not-use-in-production";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            // Minimum bcrypt cost keeps the suite fast.
            bcrypt_cost: 4,
            allow_insecure_dev_secret: false,
        },
        bootstrap: BootstrapConfig {
            admin_name: "Admin".to_string(),
            admin_email: "admin@travelmate.com".to_string(),
            admin_password: "admin123".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig {
            origins: "*".to_string(),
        },
    }
}

/// State over a fresh in-memory database.
pub fn create_test_state() -> Arc<AppState> {
    let config = test_config();
    let db = Database::open(&config.database.url).expect("Failed to open test database");
    Arc::new(AppState::new(config, db).expect("Failed to build test state"))
}

/// Insert a user directly, bypassing registration.
pub async fn seed_user(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> User {
    let password_hash = state
        .passwords
        .hash(password.to_string())
        .await
        .expect("Failed to hash test password");
    state
        .db
        .create_user(&NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            is_admin,
        })
        .expect("Failed to seed user")
}

/// Token issued by the state's own token service.
pub fn token_for(state: &AppState, user: &User) -> String {
    state
        .tokens
        .issue(user.id, user.is_admin)
        .expect("Failed to issue test token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Sign arbitrary claims with `secret`. `expires_in_secs` may be negative.
pub fn mint_token_with(
    alg: Algorithm,
    secret: &str,
    user_id: u64,
    is_admin: bool,
    expires_in_secs: i64,
) -> String {
    let claims = Claims {
        user_id,
        is_admin,
        exp: (Utc::now() + Duration::seconds(expires_in_secs)).timestamp() as u64,
    };
    encode(
        &Header::new(alg),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to encode JWT")
}

pub fn mint_token(secret: &str, user_id: u64, is_admin: bool, expires_in_secs: i64) -> String {
    mint_token_with(Algorithm::HS256, secret, user_id, is_admin, expires_in_secs)
}
