//! KDBX format entities built on the XML codec.
//!
//! - `context`: document version and date-write policy
//! - `uuid`: 16-byte identifiers
//! - `times`, `deleted_object`, `custom_data`: records read from and
//!   written to their XML sub-trees

pub mod context;
pub mod custom_data;
pub mod deleted_object;
pub mod times;
pub mod uuid;

pub use context::{DatePolicy, KdbxContext};
pub use custom_data::{CustomData, CustomDataItem, CustomDataMap};
pub use deleted_object::DeletedObject;
pub use times::Times;
pub use uuid::KdbxUuid;
