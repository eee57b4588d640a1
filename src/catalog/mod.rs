/// Action catalog layer - typed, schema-described actions grouped by connector
///
/// The catalog is append-only reference data: seeded at startup, read-only
/// during planning and execution. Contracts are lowered to plain JSON Schema
/// at seed time and compiled once when the registry loads.

pub mod registry;
pub mod seed;
pub mod storage;
pub mod types;

pub use registry::{CatalogRegistry, CompiledAction};
pub use storage::CatalogStorage;
pub use types::{ActionCatalogEntry, ActionExamples, ActionType, Connector, ConnectorStatus};
