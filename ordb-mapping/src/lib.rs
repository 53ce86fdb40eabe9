//! # ordb-mapping
//!
//! Conversion between generic documents and typed application objects.
//!
//! Types implement [`Mapped`] to register an ordered list of field
//! mappings. Scalar fields pass values through, nested fields recurse into
//! embedded documents, and collection fields materialize a concrete
//! container shape (`Vec`, `VecDeque`, `Box<[T]>` or `[T; N]`).
//!
//! ```ignore
//! impl Mapped for Person {
//!     fn class_name() -> &'static str {
//!         "Person"
//!     }
//!
//!     fn describe(mapper: &mut TypeMapper<Self>) {
//!         mapper
//!             .rid(|p| &p.rid, |p| &mut p.rid)
//!             .field("name", |p| &p.name, |p| &mut p.name)
//!             .collection("tags", |p| &p.tags, |p| &mut p.tags);
//!     }
//! }
//! ```

pub mod collection;
pub mod element;
pub mod error;
pub mod mapper;

pub use collection::CollectionShape;
pub use element::{Element, ElementKind};
pub use error::MappingError;
pub use mapper::{to_document, to_object, FieldKind, FieldMapping, Mapped, TypeMapper};
