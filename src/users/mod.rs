//! Account records, their storage backends, and the CRUD service and routes
//! built on top of them.

pub mod memory;
pub mod postgres;
pub mod routes;
pub mod service;
pub mod store;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;
pub use service::{NewAccount, UserChanges, UserService, UserView};
pub use store::{NewUser, UserRecord, UserStore, UserUpdate};
