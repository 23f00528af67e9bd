pub mod store;

pub use store::{SqliteStore, StoredWorkflow};
