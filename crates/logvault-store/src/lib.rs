//! SQLite persistence layer: pool bootstrap, schema creation and the
//! concrete repository implementations behind the core traits.
//!
//! Storage conventions: timestamps are unix-millisecond integers, ids are
//! text UUIDs, levels are integers, and compound fields (metadata maps,
//! recipient lists, contacts, preferences) are serialized JSON text columns.

pub mod clients;
mod convert;
pub mod db;
pub mod logs;
pub mod services;
pub mod users;

pub use clients::SqliteClientRepository;
pub use logs::SqliteLogRepository;
pub use services::SqliteServiceRepository;
pub use users::SqliteUserRepository;
