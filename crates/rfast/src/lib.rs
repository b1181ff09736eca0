//! rfast: compact 16-byte field values for FAST-style message codecs.
//!
//! Every field of a decoded message is stored in one [`ValueStorage`]: a
//! 16-byte cell that holds an integer, a decimal, a string or byte vector, a
//! group, a sequence or a template reference. The active variant is known
//! from the schema, not stored in the value.
//!
//! # Overview
//!
//! The storage is designed for:
//! - **Fixed footprint**: one value is exactly 16 bytes on every target
//! - **Cheap defaults**: default tables are built from borrowed literals and
//!   copied into messages without allocating
//! - **C interop**: [`RawValueStorage`] is bit-for-bit interchangeable with
//!   the C layout and the [`ffi`] functions are exported under C names
//!
//! # Quick Start
//!
//! ```rust
//! use rfast::{DecimalValueStorage, FieldKind, IntValueStorage, OwnedValue, StringValueStorage};
//!
//! // Literal values for a default table
//! let qty = IntValueStorage::<i64>::new(42);
//! assert_eq!(qty.value(), 42);
//!
//! let price = DecimalValueStorage::new(-12345, -3);
//! assert_eq!(price.to_string(), "-12.345");
//!
//! let venue = StringValueStorage::new("abc");
//! assert_eq!(venue.array_length(), 3);
//!
//! // An owned field that allocates on write and releases on drop
//! let mut symbol = OwnedValue::new(FieldKind::Ascii);
//! symbol.view_mut().assign_str("XNAS").unwrap();
//! assert_eq!(symbol.view().as_str().unwrap(), Some("XNAS"));
//! ```
//!
//! # Modules
//!
//! - [`raw`]: Opaque 16-byte container for the C boundary
//! - [`layout`]: Bit layout shared by every variant
//! - [`flat`]: Free accessor functions over the raw container
//! - [`ffi`]: `extern "C"` exports of the flat accessors
//! - [`storage`]: The tagged value and its generic operations
//! - [`typed`]: Typed constructors for each kind
//! - [`decimal`]: Decimal text formatting and parsing
//! - [`aggregate`]: Fixed and trailing subfield storage
//! - [`kind`]: Field kinds, group layouts and templates
//! - [`owned`]: Owning and borrowing handles
//! - [`error`]: Error types
//! - [`limits`]: Size limits
//!
//! # Ownership
//!
//! A [`ValueStorage`] is plain bits and never releases anything. Content is
//! released only by [`OwnedValue`], exactly once, and never through a link or
//! a borrowed array.

pub mod aggregate;
mod alloc;
pub mod decimal;
pub mod error;
pub mod ffi;
pub mod flat;
pub mod kind;
pub mod layout;
pub mod limits;
pub mod owned;
pub mod raw;
pub mod storage;
pub mod typed;

// Re-export commonly used types at crate root
pub use aggregate::{Trailing, ValueBlock, ValueStorageArray};
pub use decimal::{DecimalFormat, format_decimal, parse_decimal};
pub use error::{DecimalParseError, ValueError};
pub use kind::{FieldKind, GroupLayout, Template, TemplateRegistry};
pub use owned::{OwnedValue, ValueMut, ValueRef};
pub use raw::RawValueStorage;
pub use storage::{StorageInt, StorageWord, ValueStorage};
pub use typed::{ByteVectorValueStorage, DecimalValueStorage, IntValueStorage, StringValueStorage};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
