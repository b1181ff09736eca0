//! Field kinds and template descriptors.
//!
//! A [`ValueStorage`] does not record which variant it holds; the schema
//! does. These types are the minimal schema view the value layer needs: the
//! kind of every field, the layout of groups and sequence elements, and the
//! templates a template reference can select at decode time.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::ValueError;
use crate::storage::ValueStorage;

/// Protocol kind of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Int32,
    UInt32,
    Int64,
    UInt64,
    Decimal,
    /// ASCII string.
    Ascii,
    /// UTF-8 string.
    Unicode,
    ByteVector,
    /// Nested group with a fixed subfield layout.
    Group(Arc<GroupLayout>),
    /// Repeated group; every element has the given layout.
    Sequence(Arc<GroupLayout>),
    /// Dynamic reference to a template chosen at decode time.
    TemplateRef,
}

impl FieldKind {
    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Int32 => "int32",
            FieldKind::UInt32 => "uint32",
            FieldKind::Int64 => "int64",
            FieldKind::UInt64 => "uint64",
            FieldKind::Decimal => "decimal",
            FieldKind::Ascii => "ascii",
            FieldKind::Unicode => "unicode",
            FieldKind::ByteVector => "byte vector",
            FieldKind::Group(_) => "group",
            FieldKind::Sequence(_) => "sequence",
            FieldKind::TemplateRef => "template reference",
        }
    }

    /// Returns true for the integer kinds.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FieldKind::Int32 | FieldKind::UInt32 | FieldKind::Int64 | FieldKind::UInt64
        )
    }

    /// Returns true for string and byte-vector kinds.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            FieldKind::Ascii | FieldKind::Unicode | FieldKind::ByteVector
        )
    }

    /// Returns true for group, sequence and template-reference kinds.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            FieldKind::Group(_) | FieldKind::Sequence(_) | FieldKind::TemplateRef
        )
    }

    /// The initial storage for a field of this kind.
    ///
    /// Every kind starts absent and defined, except template references,
    /// which start with no template selected (all zero).
    pub fn default_storage(&self) -> ValueStorage {
        match self {
            FieldKind::TemplateRef => ValueStorage::undefined(),
            _ => ValueStorage::absent(),
        }
    }
}

/// Subfield layout of a group or sequence element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    name: String,
    fields: Vec<FieldKind>,
}

impl GroupLayout {
    /// Creates a layout from its subfield kinds.
    pub fn new(name: impl Into<String>, fields: Vec<FieldKind>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Layout name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subfield kinds in order.
    pub fn fields(&self) -> &[FieldKind] {
        &self.fields
    }

    /// Number of subfields.
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Default storage for each subfield.
    pub fn default_values(&self) -> Vec<ValueStorage> {
        self.fields.iter().map(FieldKind::default_storage).collect()
    }
}

/// A template that a template reference can select.
///
/// Values only point at templates; they never own them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    id: u32,
    layout: Arc<GroupLayout>,
}

impl Template {
    /// Creates a template with the given id, name and field kinds.
    pub fn new(id: u32, name: impl Into<String>, fields: Vec<FieldKind>) -> Self {
        Self {
            id,
            layout: Arc::new(GroupLayout::new(name, fields)),
        }
    }

    /// Template id as carried on the wire.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Template name.
    pub fn name(&self) -> &str {
        self.layout.name()
    }

    /// Field layout of the template.
    pub fn layout(&self) -> &Arc<GroupLayout> {
        &self.layout
    }
}

/// Templates known to a decoder, keyed by id.
///
/// Registered templates live for the rest of the program, matching the
/// lifetime of schema data that values point into.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: FxHashMap<u32, &'static Template>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template and returns its `'static` descriptor.
    pub fn register(&mut self, template: Template) -> Result<&'static Template, ValueError> {
        let id = template.id();
        if self.templates.contains_key(&id) {
            return Err(ValueError::DuplicateTemplate { id });
        }
        let template: &'static Template = Box::leak(Box::new(template));
        self.templates.insert(id, template);
        Ok(template)
    }

    /// Looks up a template by id.
    pub fn get(&self, id: u32) -> Option<&'static Template> {
        self.templates.get(&id).copied()
    }

    /// Looks up a template by id, failing if it is unknown.
    pub fn resolve(&self, id: u32) -> Result<&'static Template, ValueError> {
        self.get(id).ok_or(ValueError::UnknownTemplate { id })
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no template is registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterates over registered templates in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &'static Template> + '_ {
        self.templates.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert!(FieldKind::Int32.is_integer());
        assert!(FieldKind::UInt64.is_integer());
        assert!(!FieldKind::Decimal.is_integer());
        assert!(FieldKind::Ascii.is_array());
        assert!(FieldKind::ByteVector.is_array());
        assert!(!FieldKind::Sequence(Arc::new(GroupLayout::new("s", vec![]))).is_array());
        assert!(FieldKind::TemplateRef.is_aggregate());
        assert_eq!(FieldKind::Unicode.name(), "unicode");
    }

    #[test]
    fn test_default_storage() {
        assert!(FieldKind::Int64.default_storage().is_defined());
        assert!(!FieldKind::Int64.default_storage().is_present());
        assert_eq!(FieldKind::TemplateRef.default_storage(), ValueStorage::undefined());
    }

    #[test]
    fn test_group_layout() {
        let layout = GroupLayout::new("Quote", vec![FieldKind::UInt32, FieldKind::Decimal]);
        assert_eq!(layout.name(), "Quote");
        assert_eq!(layout.arity(), 2);
        assert_eq!(layout.default_values(), vec![ValueStorage::absent(); 2]);
    }

    #[test]
    fn test_registry() {
        let mut registry = TemplateRegistry::new();
        assert!(registry.is_empty());

        let t = registry
            .register(Template::new(7, "Heartbeat", vec![FieldKind::UInt64]))
            .unwrap();
        assert_eq!(t.id(), 7);
        assert_eq!(t.name(), "Heartbeat");
        assert_eq!(registry.len(), 1);
        assert!(std::ptr::eq(registry.resolve(7).unwrap(), t));
        assert_eq!(registry.iter().count(), 1);

        assert!(matches!(
            registry.resolve(8),
            Err(ValueError::UnknownTemplate { id: 8 })
        ));
        assert!(matches!(
            registry.register(Template::new(7, "Again", vec![])),
            Err(ValueError::DuplicateTemplate { id: 7 })
        ));
    }
}
