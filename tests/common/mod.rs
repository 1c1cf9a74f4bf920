#![allow(dead_code)]

use std::sync::Arc;

use accounts_api::auth::{PasswordService, Role};
use accounts_api::auth::responses::LoginResponse;
use accounts_api::test_support::TestRocketBuilder;
use accounts_api::users::{InMemoryUserStore, NewUser, UserRecord, UserStore};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use rocket::serde::json::json;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "Adm1n#Qzv8";

pub struct TestApp {
    pub client: Client,
    pub store: Arc<InMemoryUserStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryUserStore::new());
        let client = TestRocketBuilder::new()
            .with_store(store.clone())
            .async_client()
            .await;
        Self { client, store }
    }

    /// Insert a record directly, bypassing the password strength rules.
    pub async fn seed_user(&self, name: &str, email: &str, password: &str, role: Role) -> UserRecord {
        let password_hash = PasswordService::new()
            .expect("password service")
            .hash_password(password)
            .expect("hash password");
        self.store
            .create(NewUser {
                name: name.into(),
                email: email.into(),
                password_hash,
                role,
            })
            .await
            .expect("seed user")
    }

    pub async fn seed_admin(&self) -> UserRecord {
        self.seed_user("System Administrator", ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin)
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> LoginResponse {
        let response = self
            .client
            .post("/auth/login")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "password": password }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json().await.expect("login payload")
    }
}

pub fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}
