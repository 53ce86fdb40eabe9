//! Per-type mapping descriptors.
//!
//! A [`Mapped`] type describes itself once as an ordered list of field
//! mappings, each pairing a (possibly dotted) document field path with an
//! accessor into the object. The resulting [`TypeMapper`] is cached in a
//! process-wide registry keyed by type.

use crate::collection::{build_collection, collection_value, CollectionShape};
use crate::element::{Element, ElementKind};
use crate::error::MappingError;
use dashmap::DashMap;
use ordb_protocol::{Document, Rid, Value};
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

/// An application type that converts to and from documents.
pub trait Mapped: Default + Send + Sync + 'static {
    /// Schema class written on documents produced from this type.
    fn class_name() -> &'static str;

    /// Registers the type's fields.
    fn describe(mapper: &mut TypeMapper<Self>);
}

/// Structural kind of a field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Single(ElementKind),
    Collection {
        shape: &'static str,
        element: ElementKind,
    },
}

/// One field of a mapped type.
pub trait FieldMapping<T>: Send + Sync {
    fn field_path(&self) -> &str;

    fn kind(&self) -> FieldKind;

    fn map_to_object(&self, source: &Document, target: &mut T) -> Result<(), MappingError>;

    fn map_to_document(&self, source: &T, target: &mut Document) -> Result<(), MappingError>;
}

struct Accessor<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

/// Plain field. Missing or null source values leave the target untouched.
struct ValueField<T, V> {
    path: &'static str,
    access: Accessor<T, V>,
}

impl<T: Send + Sync, V: Element> FieldMapping<T> for ValueField<T, V> {
    fn field_path(&self) -> &str {
        self.path
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Single(V::KIND)
    }

    fn map_to_object(&self, source: &Document, target: &mut T) -> Result<(), MappingError> {
        match source.get_path(self.path) {
            None | Some(Value::Null) => Ok(()),
            Some(value) => {
                *(self.access.get_mut)(target) = V::from_value(value, self.path)?;
                Ok(())
            }
        }
    }

    fn map_to_document(&self, source: &T, target: &mut Document) -> Result<(), MappingError> {
        target.set_path(self.path, (self.access.get)(source).to_value()?);
        Ok(())
    }
}

/// Optional field. Missing or null source values map to `None`.
struct OptionalField<T, V> {
    path: &'static str,
    access: Accessor<T, Option<V>>,
}

impl<T: Send + Sync, V: Element> FieldMapping<T> for OptionalField<T, V> {
    fn field_path(&self) -> &str {
        self.path
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Single(V::KIND)
    }

    fn map_to_object(&self, source: &Document, target: &mut T) -> Result<(), MappingError> {
        let value = match source.get_path(self.path) {
            None | Some(Value::Null) => None,
            Some(value) => Some(V::from_value(value, self.path)?),
        };
        *(self.access.get_mut)(target) = value;
        Ok(())
    }

    fn map_to_document(&self, source: &T, target: &mut Document) -> Result<(), MappingError> {
        let value = match (self.access.get)(source) {
            Some(value) => value.to_value()?,
            None => Value::Null,
        };
        target.set_path(self.path, value);
        Ok(())
    }
}

/// Collection field. Empty sources map to `None`.
struct CollectionField<T, C> {
    path: &'static str,
    access: Accessor<T, Option<C>>,
}

impl<T: Send + Sync, C: CollectionShape> FieldMapping<T> for CollectionField<T, C> {
    fn field_path(&self) -> &str {
        self.path
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Collection {
            shape: C::SHAPE,
            element: C::Item::KIND,
        }
    }

    fn map_to_object(&self, source: &Document, target: &mut T) -> Result<(), MappingError> {
        *(self.access.get_mut)(target) = build_collection(source.get_path(self.path), self.path)?;
        Ok(())
    }

    fn map_to_document(&self, source: &T, target: &mut Document) -> Result<(), MappingError> {
        let value = collection_value((self.access.get)(source).as_ref())?;
        target.set_path(self.path, value);
        Ok(())
    }
}

/// Field descriptor for one mapped type.
pub struct TypeMapper<T> {
    class_name: &'static str,
    fields: Vec<Box<dyn FieldMapping<T>>>,
    rid: Option<Accessor<T, Option<Rid>>>,
    version: Option<Accessor<T, i32>>,
}

fn registry() -> &'static DashMap<TypeId, Arc<dyn Any + Send + Sync>> {
    static REGISTRY: OnceLock<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = OnceLock::new();
    REGISTRY.get_or_init(DashMap::new)
}

impl<T: Mapped> TypeMapper<T> {
    fn build() -> Self {
        let mut mapper = TypeMapper {
            class_name: T::class_name(),
            fields: Vec::new(),
            rid: None,
            version: None,
        };
        T::describe(&mut mapper);
        tracing::debug!(
            class = mapper.class_name,
            fields = mapper.fields.len(),
            "registered type mapper"
        );
        mapper
    }

    /// Returns the cached descriptor for `T`, building it on first use.
    pub fn get() -> Arc<Self> {
        let cached = registry()
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(Self::build()) as Arc<dyn Any + Send + Sync>)
            .value()
            .clone();
        cached
            .downcast::<Self>()
            .unwrap_or_else(|_| Arc::new(Self::build()))
    }

    /// Maps `path` to a single value.
    pub fn field<V: Element>(
        &mut self,
        path: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        self.fields.push(Box::new(ValueField {
            path,
            access: Accessor { get, get_mut },
        }));
        self
    }

    /// Maps `path` to a value that may be absent.
    pub fn optional<V: Element>(
        &mut self,
        path: &'static str,
        get: fn(&T) -> &Option<V>,
        get_mut: fn(&mut T) -> &mut Option<V>,
    ) -> &mut Self {
        self.fields.push(Box::new(OptionalField {
            path,
            access: Accessor { get, get_mut },
        }));
        self
    }

    /// Maps `path` to a collection of shape `C`.
    pub fn collection<C: CollectionShape>(
        &mut self,
        path: &'static str,
        get: fn(&T) -> &Option<C>,
        get_mut: fn(&mut T) -> &mut Option<C>,
    ) -> &mut Self {
        self.fields.push(Box::new(CollectionField {
            path,
            access: Accessor { get, get_mut },
        }));
        self
    }

    /// Binds the record identity.
    pub fn rid(&mut self, get: fn(&T) -> &Option<Rid>, get_mut: fn(&mut T) -> &mut Option<Rid>) -> &mut Self {
        self.rid = Some(Accessor { get, get_mut });
        self
    }

    /// Binds the record version.
    pub fn version(&mut self, get: fn(&T) -> &i32, get_mut: fn(&mut T) -> &mut i32) -> &mut Self {
        self.version = Some(Accessor { get, get_mut });
        self
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn fields(&self) -> impl Iterator<Item = &dyn FieldMapping<T>> {
        self.fields.iter().map(|f| f.as_ref())
    }

    /// Applies every field of `source` onto `target`.
    pub fn to_object(&self, source: &Document, target: &mut T) -> Result<(), MappingError> {
        if let Some(rid) = &self.rid {
            *(rid.get_mut)(target) = source.rid;
        }
        if let Some(version) = &self.version {
            *(version.get_mut)(target) = source.version;
        }
        for field in &self.fields {
            field.map_to_object(source, target)?;
        }
        Ok(())
    }

    /// Builds a document from `source`.
    pub fn to_document(&self, source: &T) -> Result<Document, MappingError> {
        let mut doc = Document::with_class(self.class_name);
        if let Some(rid) = &self.rid {
            doc.rid = *(rid.get)(source);
        }
        if let Some(version) = &self.version {
            doc.version = *(version.get)(source);
        }
        for field in &self.fields {
            field.map_to_document(source, &mut doc)?;
        }
        Ok(doc)
    }
}

/// Maps a document onto a new instance of `T`.
pub fn to_object<T: Mapped>(source: &Document) -> Result<T, MappingError> {
    let mut target = T::default();
    TypeMapper::<T>::get().to_object(source, &mut target)?;
    Ok(target)
}

/// Maps an object onto a new document.
pub fn to_document<T: Mapped>(source: &T) -> Result<Document, MappingError> {
    TypeMapper::<T>::get().to_document(source)
}
