#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod users;

use crate::auth::{AuthConfig, AuthState};
use crate::db::AccountsDb;
use crate::error::ErrorResponse;
use crate::request_logger::RequestLogger;
use crate::users::{PgUserStore, UserStore};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::{Method, Status};
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Build, Catcher, Request, Rocket, Route};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Every HTTP route served by the application.
pub fn api_routes() -> Vec<Route> {
    let mut routes = routes![routes::health::health_check];
    routes.extend(auth::routes::routes());
    routes.extend(users::routes::routes());
    routes
}

pub fn api_catchers() -> Vec<Catcher> {
    catchers![json_catcher]
}

/// Renders guard and routing failures with the same JSON shape as handler errors.
#[catch(default)]
fn json_catcher(status: Status, _request: &Request<'_>) -> status::Custom<Json<ErrorResponse>> {
    let error = match status.code {
        401 => "InvalidToken",
        403 => "PermissionDenied",
        404 => "NotFound",
        400 | 422 => "InvalidInput",
        _ => "Error",
    };
    let message = status.reason().unwrap_or("Unknown error").to_string();
    status::Custom(
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message,
        }),
    )
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Patch, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::build()
        .attach(RequestLogger)
        .attach(AccountsDb::init())
        .attach(cors)
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match AccountsDb::fetch(&rocket) {
                    Some(db) => match db::run_migrations(db).await {
                        Ok(_) => {
                            log::info!("database migrations successful");
                            Ok(rocket)
                        }
                        Err(e) => {
                            log::error!("database migrations failed: {}", e);
                            Err(rocket)
                        }
                    },
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::try_on_ignite("Auth State", |rocket| async move {
            let pool = match AccountsDb::fetch(&rocket) {
                Some(db) => (**db).clone(),
                None => {
                    log::error!("database pool not available for auth state");
                    return Err(rocket);
                }
            };

            let config = match AuthConfig::from_env() {
                Ok(config) => config,
                Err(err) => {
                    log::error!("failed to load auth configuration: {}", err);
                    return Err(rocket);
                }
            };
            log::info!("auth configuration loaded: {:?}", config);

            let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));
            match AuthState::new(config, store) {
                Ok(state) => Ok(rocket.manage(state)),
                Err(err) => {
                    log::error!("failed to initialize auth services: {}", err);
                    Err(rocket)
                }
            }
        }))
        .mount("/", api_routes())
        .register("/", api_catchers())
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket};

    use crate::auth::{AuthConfig, AuthState};
    use crate::users::{InMemoryUserStore, UserStore};

    pub use database::{TestDatabase, TestDatabaseError};

    /// Auth configuration with fixed, distinct test secrets.
    pub fn test_auth_config() -> AuthConfig {
        AuthConfig {
            issuer: "https://accounts.test".into(),
            access_token_secret: "test-access-secret".into(),
            refresh_token_secret: "test-refresh-secret".into(),
            access_token_ttl_secs: 24 * 60 * 60,
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            refresh_cookie_name: "refreshToken".into(),
            cookie_secure: false,
        }
    }

    pub mod database {
        use sqlx::PgPool;
        use sqlx::postgres::PgPoolOptions;
        use testcontainers::{ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner};
        use testcontainers_modules::postgres::Postgres;
        use thiserror::Error;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Disposable, migrated Postgres instance for integration tests.
        pub struct TestDatabase {
            pool: PgPool,
            _container: ContainerAsync<Postgres>,
        }

        impl TestDatabase {
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;
                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&url)
                    .await?;
                crate::db::run_migrations(&pool).await?;

                Ok(Self {
                    pool,
                    _container: container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                &self.pool
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool.clone()
            }
        }
    }

    /// Builder for Rocket instances backed by an in-memory user store.
    pub struct TestRocketBuilder {
        figment: Figment,
        config: AuthConfig,
        store: Arc<dyn UserStore>,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                config: test_auth_config(),
                store: Arc::new(InMemoryUserStore::new()),
            }
        }

        pub fn with_store(mut self, store: Arc<dyn UserStore>) -> Self {
            self.store = store;
            self
        }

        pub fn with_config(mut self, config: AuthConfig) -> Self {
            self.config = config;
            self
        }

        pub fn build(self) -> Rocket<Build> {
            let state = AuthState::new(self.config, self.store).expect("valid test auth state");
            rocket::custom(self.figment)
                .manage(state)
                .mount("/", crate::api_routes())
                .register("/", crate::api_catchers())
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
