pub mod executor;
pub mod guard;
pub mod render;
pub mod schema;

pub use executor::{GraphExecutor, GraphRecord, Neo4jExecutor};
pub use guard::{validate, RejectionReason, SafeQuery};
pub use render::render_records;
pub use schema::SCHEMA_TEXT;
