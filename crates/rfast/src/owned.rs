//! Owning and borrowing handles over field values.
//!
//! [`OwnedValue`] pairs a [`ValueStorage`] with its [`FieldKind`] and is the
//! only place content is ever released. Release is driven by the kind:
//!
//! - arrays release their byte buffer when `capacity_in_bytes > 0`;
//! - groups release their subfield block when `owns_content` is set and
//!   `is_link` is clear;
//! - sequences release their element block when `capacity_in_bytes > 0`;
//!   the capacity covers every allocated slot;
//! - template references release their nested block when both the template
//!   and the content pointer are set.
//!
//! Everything else (links, aliases, borrowed defaults) is left alone.
//! [`ValueRef`] and [`ValueMut`] are kind-checked views into an owned tree.

use std::fmt;
use std::mem::{ManuallyDrop, size_of};
use std::ptr;

use crate::aggregate::ValueBlock;
use crate::alloc;
use crate::error::ValueError;
use crate::kind::{FieldKind, Template};
use crate::limits::{MAX_ARRAY_LENGTH, MAX_CAPACITY_IN_BYTES};
use crate::storage::{StorageInt, ValueStorage};
use crate::typed::DecimalValueStorage;

const SLOT_BYTES: usize = size_of::<ValueStorage>();

// =============================================================================
// OWNED VALUE
// =============================================================================

/// A field value that owns its content.
pub struct OwnedValue {
    storage: ValueStorage,
    kind: FieldKind,
}

impl OwnedValue {
    /// Creates a value in its initial state for `kind`.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            storage: kind.default_storage(),
            kind,
        }
    }

    /// Seeds a value from a default-table entry.
    ///
    /// Arrays, groups and sequences become borrowed aliases of the default,
    /// so nothing is allocated until the value is written. Template
    /// references cannot be marked borrowed and are deep-copied.
    ///
    /// # Safety
    ///
    /// `default` must be a valid value of `kind`, and any content it points
    /// to must stay valid and unchanged for the life of this value and its
    /// clones.
    pub unsafe fn from_default(kind: FieldKind, default: &ValueStorage) -> Self {
        let storage = unsafe { adopt(&kind, default) };
        Self { storage, kind }
    }

    /// Takes ownership of a value from [`into_raw`](Self::into_raw).
    ///
    /// # Safety
    ///
    /// `storage` must be a valid value of `kind` whose owned content is not
    /// owned by anything else.
    pub unsafe fn from_raw(kind: FieldKind, storage: ValueStorage) -> Self {
        Self { storage, kind }
    }

    /// Gives up ownership without releasing anything.
    pub fn into_raw(self) -> (FieldKind, ValueStorage) {
        let this = ManuallyDrop::new(self);
        // `this` is never dropped, so the kind is moved out exactly once.
        let kind = unsafe { ptr::read(&this.kind) };
        (kind, this.storage)
    }

    /// Field kind this value was created with.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Underlying bits. Releasing them stays with this value.
    pub fn storage(&self) -> &ValueStorage {
        &self.storage
    }

    /// Read-only view.
    pub fn view(&self) -> ValueRef<'_> {
        ValueRef {
            kind: &self.kind,
            storage: &self.storage,
        }
    }

    /// Mutable view.
    pub fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut {
            kind: &self.kind,
            storage: &mut self.storage,
        }
    }
}

impl Clone for OwnedValue {
    fn clone(&self) -> Self {
        Self {
            storage: unsafe { deep_clone(&self.kind, &self.storage) },
            kind: self.kind.clone(),
        }
    }
}

impl Drop for OwnedValue {
    fn drop(&mut self) {
        unsafe { release(&self.kind, &self.storage) };
    }
}

impl fmt::Debug for OwnedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedValue")
            .field("kind", &self.kind.name())
            .field("storage", &self.storage)
            .finish()
    }
}

// =============================================================================
// READ-ONLY VIEW
// =============================================================================

/// Kind-checked read access to a value inside an owned tree.
#[derive(Debug, Clone, Copy)]
pub struct ValueRef<'a> {
    kind: &'a FieldKind,
    storage: &'a ValueStorage,
}

impl<'a> ValueRef<'a> {
    /// Field kind of the viewed value.
    pub fn kind(&self) -> &'a FieldKind {
        self.kind
    }

    /// Underlying bits of the viewed value.
    pub fn storage(&self) -> &'a ValueStorage {
        self.storage
    }

    /// Presence; a template reference is present once a template is selected.
    pub fn is_present(&self) -> bool {
        match self.kind {
            FieldKind::TemplateRef => !self.storage.template_ptr().is_null(),
            _ => self.storage.is_present(),
        }
    }

    /// Defined bit; a template reference is defined once a template is selected.
    pub fn is_defined(&self) -> bool {
        match self.kind {
            FieldKind::TemplateRef => !self.storage.template_ptr().is_null(),
            _ => self.storage.is_defined(),
        }
    }

    /// Integer content, or `None` if absent.
    pub fn int<I: StorageInt>(&self) -> Result<Option<I>, ValueError> {
        if !self.kind.is_integer() {
            return Err(mismatch("int", "integer", self.kind));
        }
        Ok(self.storage.is_present().then(|| self.storage.get::<I>()))
    }

    /// Decimal content, or `None` if absent.
    pub fn decimal(&self) -> Result<Option<DecimalValueStorage>, ValueError> {
        if *self.kind != FieldKind::Decimal {
            return Err(mismatch("decimal", "decimal", self.kind));
        }
        Ok(self
            .storage
            .is_present()
            .then(|| DecimalValueStorage::from_storage(*self.storage)))
    }

    /// Array content, or `None` if absent.
    pub fn bytes(&self) -> Result<Option<&'a [u8]>, ValueError> {
        if !self.kind.is_array() {
            return Err(mismatch("bytes", "string or byte vector", self.kind));
        }
        if self.storage.is_empty() {
            return Ok(None);
        }
        // Owned or borrowed, the content outlives the tree borrow.
        Ok(Some(unsafe { self.storage.array_bytes() }))
    }

    /// String content, or `None` if absent.
    pub fn as_str(&self) -> Result<Option<&'a str>, ValueError> {
        if !matches!(self.kind, FieldKind::Ascii | FieldKind::Unicode) {
            return Err(mismatch("as_str", "string", self.kind));
        }
        self.bytes()?
            .map(|bytes| std::str::from_utf8(bytes).map_err(|_| ValueError::InvalidUtf8))
            .transpose()
    }

    /// Group subfield `index`.
    pub fn field(&self, index: usize) -> Result<ValueRef<'a>, ValueError> {
        let FieldKind::Group(layout) = self.kind else {
            return Err(mismatch("field", "group", self.kind));
        };
        let fields = layout.fields();
        check_index("group field", index, fields.len())?;
        let content: *const ValueStorage = self.storage.get();
        if content.is_null() {
            return Err(ValueError::NoContent { what: "group" });
        }
        Ok(ValueRef {
            kind: &fields[index],
            storage: unsafe { &*content.add(index) },
        })
    }

    /// Sequence length; absent sequences have length 0.
    pub fn len(&self) -> Result<usize, ValueError> {
        if !matches!(self.kind, FieldKind::Sequence(_)) {
            return Err(mismatch("len", "sequence", self.kind));
        }
        Ok(self.storage.array_length() as usize)
    }

    /// Returns true for a sequence with no elements.
    pub fn is_empty(&self) -> Result<bool, ValueError> {
        Ok(self.len()? == 0)
    }

    /// Field `field` of sequence element `element`.
    pub fn element_field(&self, element: usize, field: usize) -> Result<ValueRef<'a>, ValueError> {
        let FieldKind::Sequence(layout) = self.kind else {
            return Err(mismatch("element_field", "sequence", self.kind));
        };
        let fields = layout.fields();
        check_index("sequence element", element, self.storage.array_length() as usize)?;
        check_index("element field", field, fields.len())?;
        let content: *const ValueStorage = self.storage.get();
        if content.is_null() {
            return Err(ValueError::NoContent { what: "sequence" });
        }
        Ok(ValueRef {
            kind: &fields[field],
            storage: unsafe { &*content.add(element * fields.len() + field) },
        })
    }

    /// The selected template, or `None`.
    pub fn template(&self) -> Result<Option<&'static Template>, ValueError> {
        if *self.kind != FieldKind::TemplateRef {
            return Err(mismatch("template", "template reference", self.kind));
        }
        // Only registry templates are ever selected, and those are 'static.
        Ok(unsafe { self.storage.template_ptr().as_ref() })
    }

    /// Field `index` of the selected template.
    pub fn template_field(&self, index: usize) -> Result<ValueRef<'a>, ValueError> {
        let template = self.template()?.ok_or(ValueError::NoTemplate)?;
        let fields = template.layout().fields();
        check_index("template field", index, fields.len())?;
        let content = self.storage.template_content();
        if content.is_null() {
            return Err(ValueError::NoContent {
                what: "template reference",
            });
        }
        Ok(ValueRef {
            kind: &fields[index],
            storage: unsafe { &*content.add(index) },
        })
    }

    /// A shallow copy that can never release the content it points to.
    ///
    /// Arrays and sequences get capacity 0; groups become links. A template
    /// reference has no flag to mark it borrowed, so its alias is a plain bit
    /// copy and is deep-copied if adopted into an [`OwnedValue`].
    pub fn alias(&self) -> ValueStorage {
        alias(self.kind, self.storage)
    }

    /// Deep copy into a new owner.
    pub fn to_owned_value(&self) -> OwnedValue {
        OwnedValue {
            storage: unsafe { deep_clone(self.kind, self.storage) },
            kind: self.kind.clone(),
        }
    }
}

// =============================================================================
// MUTABLE VIEW
// =============================================================================

/// Kind-checked write access to a value inside an owned tree.
#[derive(Debug)]
pub struct ValueMut<'a> {
    kind: &'a FieldKind,
    storage: &'a mut ValueStorage,
}

impl<'a> ValueMut<'a> {
    /// Field kind of the value being written.
    pub fn kind(&self) -> &'a FieldKind {
        self.kind
    }

    /// Read-only view of the same value.
    pub fn view(&self) -> ValueRef<'_> {
        ValueRef {
            kind: self.kind,
            storage: &*self.storage,
        }
    }

    /// Sets presence.
    ///
    /// On arrays and sequences `true` means present with length 0, as with
    /// [`ValueStorage::set_present`]; owned content is kept for reuse. On a
    /// template reference `false` releases the nested fields and clears the
    /// selection, and `true` requires a template to be selected already.
    /// Marking a group with no subfields present gives it an owned block of
    /// defaults.
    pub fn set_present(&mut self, present: bool) -> Result<(), ValueError> {
        let kind: &'a FieldKind = self.kind;
        if let FieldKind::Group(layout) = kind {
            if present && self.storage.get::<*const ValueStorage>().is_null() {
                unsafe { own_group(layout.fields(), self.storage) };
            }
        }
        if *self.kind != FieldKind::TemplateRef {
            self.storage.set_present(present);
            return Ok(());
        }
        if present {
            if self.storage.template_ptr().is_null() {
                return Err(ValueError::NoTemplate);
            }
        } else {
            self.reset();
        }
        Ok(())
    }

    /// Sets the defined bit. Template references have none.
    pub fn set_defined(&mut self, defined: bool) -> Result<(), ValueError> {
        if *self.kind == FieldKind::TemplateRef {
            return Err(mismatch("set_defined", "non-template", self.kind));
        }
        self.storage.set_defined(defined);
        Ok(())
    }

    /// Stores an integer and marks the value present.
    pub fn set_int<I: StorageInt>(&mut self, value: I) -> Result<(), ValueError> {
        if !self.kind.is_integer() {
            return Err(mismatch("set_int", "integer", self.kind));
        }
        self.storage.set(value);
        self.storage.set_present(true);
        Ok(())
    }

    /// Stores a decimal and marks the value present.
    pub fn set_decimal(&mut self, mantissa: i64, exponent: i16) -> Result<(), ValueError> {
        if *self.kind != FieldKind::Decimal {
            return Err(mismatch("set_decimal", "decimal", self.kind));
        }
        let mut decimal = DecimalValueStorage::from_storage(*self.storage);
        decimal.set_mantissa(mantissa);
        decimal.set_exponent(exponent);
        decimal.set_present(true);
        *self.storage = decimal.storage();
        Ok(())
    }

    /// Copies `bytes` into owned content.
    ///
    /// Owned capacity is reused when it is large enough; otherwise a new
    /// buffer of exactly `bytes.len()` is allocated and the old one released.
    pub fn assign_bytes(&mut self, bytes: &[u8]) -> Result<(), ValueError> {
        if !self.kind.is_array() {
            return Err(mismatch("assign_bytes", "string or byte vector", self.kind));
        }
        check_text(self.kind, bytes)?;
        let len = check_array_len(self.kind, bytes.len())?;

        let capacity = self.storage.capacity_in_bytes() as usize;
        let content: *mut u8 = self.storage.get();
        if bytes.is_empty() {
            if capacity == 0 {
                self.storage.set(ptr::null::<u8>());
            }
        } else if capacity >= bytes.len() && !content.is_null() {
            unsafe { ptr::copy(bytes.as_ptr(), content, bytes.len()) };
        } else {
            let buffer = alloc::allocate_bytes(bytes.len());
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), buffer, bytes.len()) };
            unsafe { release_array(self.storage) };
            self.storage.set(buffer);
            self.storage.set_capacity_in_bytes(len);
        }
        self.storage.set_array_length(len);
        Ok(())
    }

    /// Copies a string into owned content; `Ascii` values reject non-ASCII.
    pub fn assign_str(&mut self, value: &str) -> Result<(), ValueError> {
        if !matches!(self.kind, FieldKind::Ascii | FieldKind::Unicode) {
            return Err(mismatch("assign_str", "string", self.kind));
        }
        self.assign_bytes(value.as_bytes())
    }

    /// Points the value at static bytes, releasing any owned buffer.
    pub fn borrow_bytes(&mut self, bytes: &'static [u8]) -> Result<(), ValueError> {
        if !self.kind.is_array() {
            return Err(mismatch("borrow_bytes", "string or byte vector", self.kind));
        }
        check_text(self.kind, bytes)?;
        let len = check_array_len(self.kind, bytes.len())?;
        unsafe { release_array(self.storage) };
        self.storage.set(bytes.as_ptr());
        self.storage.set_array_length(len);
        Ok(())
    }

    /// Replaces the value with a non-releasing alias of `source`.
    ///
    /// Template references are deep-copied instead.
    ///
    /// # Safety
    ///
    /// Same contract as [`OwnedValue::from_default`].
    pub unsafe fn assign_alias(&mut self, source: &ValueStorage) {
        let adopted = unsafe { adopt(self.kind, source) };
        self.reset();
        *self.storage = adopted;
    }

    /// Group subfield `index` for writing; marks the group present.
    ///
    /// A linked or borrowed group is first copied into owned storage, and
    /// a group with no subfields yet gets a block of defaults.
    pub fn field_mut(&mut self, index: usize) -> Result<ValueMut<'_>, ValueError> {
        let kind: &'a FieldKind = self.kind;
        let FieldKind::Group(layout) = kind else {
            return Err(mismatch("field_mut", "group", kind));
        };
        let fields = layout.fields();
        check_index("group field", index, fields.len())?;

        unsafe { own_group(fields, self.storage) };
        self.storage.set_present(true);
        let content: *mut ValueStorage = self.storage.get();
        Ok(ValueMut {
            kind: &fields[index],
            storage: unsafe { &mut *content.add(index) },
        })
    }

    /// Makes this group share the subfields of `target` without owning them.
    ///
    /// # Safety
    ///
    /// `target` must be a group of the same layout, and its subfield block
    /// must stay valid for the life of this value and its clones.
    pub unsafe fn link(&mut self, target: &ValueStorage) -> Result<(), ValueError> {
        if !matches!(self.kind, FieldKind::Group(_)) {
            return Err(mismatch("link", "group", self.kind));
        }
        let linked = alias(self.kind, target);
        self.reset();
        *self.storage = linked;
        Ok(())
    }

    /// Sets the sequence length.
    ///
    /// Shrinking releases the dropped elements; growing fills new elements
    /// with layout defaults, reallocating when capacity runs out.
    pub fn resize(&mut self, len: usize) -> Result<(), ValueError> {
        let kind: &'a FieldKind = self.kind;
        let FieldKind::Sequence(layout) = kind else {
            return Err(mismatch("resize", "sequence", kind));
        };
        if len > MAX_ARRAY_LENGTH as usize {
            return Err(ValueError::LengthExceedsLimit {
                field: "sequence",
                len,
                max: MAX_ARRAY_LENGTH as usize,
            });
        }
        let fields = layout.fields();
        let arity = fields.len();
        if arity > 0 {
            let max_len = MAX_CAPACITY_IN_BYTES / (SLOT_BYTES * arity);
            let too_long = || ValueError::LengthExceedsLimit {
                field: "sequence",
                len,
                max: max_len,
            };
            if len > max_len {
                return Err(too_long());
            }
            unsafe { own_sequence(fields, self.storage)? };

            let slots = self.storage.capacity_in_bytes() as usize / SLOT_BYTES;
            let live = (self.storage.array_length() as usize * arity).min(slots);
            let needed = len * arity;
            let content: *mut ValueStorage = self.storage.get();

            if needed > slots {
                let mut block = default_block(fields, needed);
                if slots > 0 && !content.is_null() {
                    let old = unsafe { ValueBlock::from_raw(content, slots) };
                    block[..live].copy_from_slice(&old[..live]);
                    for (idx, stale) in old.iter().enumerate().skip(live) {
                        unsafe { release(&fields[idx % arity], stale) };
                    }
                }
                self.storage.set(block.into_raw());
                self.storage.set_capacity_in_bytes((needed * SLOT_BYTES) as u32);
            } else {
                let (from, to) = if needed < live { (needed, live) } else { (live, needed) };
                for idx in from..to {
                    let slot = unsafe { &mut *content.add(idx) };
                    unsafe { release(&fields[idx % arity], slot) };
                    *slot = fields[idx % arity].default_storage();
                }
            }
        }
        self.storage.set_array_length(len as u32);
        Ok(())
    }

    /// Field `field` of sequence element `element` for writing.
    pub fn element_field_mut(
        &mut self,
        element: usize,
        field: usize,
    ) -> Result<ValueMut<'_>, ValueError> {
        let kind: &'a FieldKind = self.kind;
        let FieldKind::Sequence(layout) = kind else {
            return Err(mismatch("element_field_mut", "sequence", kind));
        };
        let fields = layout.fields();
        check_index("sequence element", element, self.storage.array_length() as usize)?;
        check_index("element field", field, fields.len())?;

        unsafe { own_sequence(fields, self.storage)? };
        let content: *mut ValueStorage = self.storage.get();
        if content.is_null() {
            return Err(ValueError::NoContent { what: "sequence" });
        }
        Ok(ValueMut {
            kind: &fields[field],
            storage: unsafe { &mut *content.add(element * fields.len() + field) },
        })
    }

    /// Selects `template`, replacing any nested fields with its defaults.
    pub fn set_template(&mut self, template: &'static Template) -> Result<(), ValueError> {
        if *self.kind != FieldKind::TemplateRef {
            return Err(mismatch("set_template", "template reference", self.kind));
        }
        self.reset();
        let block = ValueBlock::from_values(&template.layout().default_values());
        self.storage.set_template_ptr(template);
        self.storage.set(block.into_raw());
        Ok(())
    }

    /// Field `index` of the selected template for writing.
    pub fn template_field_mut(&mut self, index: usize) -> Result<ValueMut<'_>, ValueError> {
        let template = self.view().template()?.ok_or(ValueError::NoTemplate)?;
        let fields = template.layout().fields();
        check_index("template field", index, fields.len())?;
        let content = self.storage.template_content();
        if content.is_null() {
            return Err(ValueError::NoContent {
                what: "template reference",
            });
        }
        Ok(ValueMut {
            kind: &fields[index],
            storage: unsafe { &mut *content.add(index) },
        })
    }

    /// Releases owned content and returns the value to its initial state.
    fn reset(&mut self) {
        unsafe { release(self.kind, &*self.storage) };
        *self.storage = self.kind.default_storage();
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn mismatch(operation: &'static str, expected: &'static str, kind: &FieldKind) -> ValueError {
    ValueError::KindMismatch {
        operation,
        expected,
        actual: kind.name(),
    }
}

fn check_index(what: &'static str, index: usize, size: usize) -> Result<(), ValueError> {
    if index >= size {
        return Err(ValueError::IndexOutOfBounds { what, index, size });
    }
    Ok(())
}

fn check_array_len(kind: &FieldKind, len: usize) -> Result<u32, ValueError> {
    if len > MAX_CAPACITY_IN_BYTES {
        return Err(ValueError::LengthExceedsLimit {
            field: kind.name(),
            len,
            max: MAX_CAPACITY_IN_BYTES,
        });
    }
    Ok(len as u32)
}

fn check_text(kind: &FieldKind, bytes: &[u8]) -> Result<(), ValueError> {
    match kind {
        FieldKind::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
            Some(position) => Err(ValueError::NonAscii { position }),
            None => Ok(()),
        },
        FieldKind::Unicode => std::str::from_utf8(bytes)
            .map(|_| ())
            .map_err(|_| ValueError::InvalidUtf8),
        _ => Ok(()),
    }
}

fn default_block(fields: &[FieldKind], slots: usize) -> ValueBlock {
    let mut block = ValueBlock::new(slots);
    for (idx, slot) in block.iter_mut().enumerate() {
        *slot = fields[idx % fields.len()].default_storage();
    }
    block
}

fn alias(kind: &FieldKind, source: &ValueStorage) -> ValueStorage {
    let mut out = *source;
    match kind {
        FieldKind::Ascii | FieldKind::Unicode | FieldKind::ByteVector | FieldKind::Sequence(_) => {
            out.set_capacity_in_bytes(0);
        }
        FieldKind::Group(_) => {
            let linked = !source.get::<*const ValueStorage>().is_null();
            out.set_group_flags(false, linked);
        }
        _ => {}
    }
    out
}

/// Takes a value that this tree will not own: aliased where the kind can
/// express it, deep-copied otherwise.
unsafe fn adopt(kind: &FieldKind, source: &ValueStorage) -> ValueStorage {
    match kind {
        FieldKind::TemplateRef => unsafe { deep_clone(kind, source) },
        _ => alias(kind, source),
    }
}

/// Releases an owned array buffer and leaves the array borrowing nothing.
unsafe fn release_array(value: &mut ValueStorage) {
    let capacity = value.capacity_in_bytes() as usize;
    let content: *mut u8 = value.get();
    if capacity > 0 && !content.is_null() {
        unsafe { alloc::release_bytes(content, capacity) };
    }
    value.set_capacity_in_bytes(0);
    value.set(ptr::null::<u8>());
}

/// Releases everything `value` owns. `value` itself is left as is.
unsafe fn release(kind: &FieldKind, value: &ValueStorage) {
    match kind {
        FieldKind::Ascii | FieldKind::Unicode | FieldKind::ByteVector => {
            let capacity = value.capacity_in_bytes() as usize;
            let content: *mut u8 = value.get();
            if capacity > 0 && !content.is_null() {
                unsafe { alloc::release_bytes(content, capacity) };
            }
        }
        FieldKind::Group(layout) => {
            let content: *mut ValueStorage = value.get();
            if value.owns_content() && !value.is_link() && !content.is_null() {
                unsafe { release_block(layout.fields(), content, layout.arity()) };
            }
        }
        FieldKind::Sequence(layout) => {
            let capacity = value.capacity_in_bytes() as usize;
            let content: *mut ValueStorage = value.get();
            if capacity > 0 && !content.is_null() {
                unsafe { release_block(layout.fields(), content, capacity / SLOT_BYTES) };
            }
        }
        FieldKind::TemplateRef => {
            let content = value.template_content();
            if let Some(template) = unsafe { value.template_ptr().as_ref() } {
                if !content.is_null() {
                    let layout = template.layout();
                    unsafe { release_block(layout.fields(), content, layout.arity()) };
                }
            }
        }
        _ => {}
    }
}

unsafe fn release_block(fields: &[FieldKind], content: *mut ValueStorage, slots: usize) {
    let block = unsafe { ValueBlock::from_raw(content, slots) };
    for (idx, value) in block.iter().enumerate() {
        unsafe { release(&fields[idx % fields.len()], value) };
    }
}

/// Copies `source`, duplicating everything it owns. Borrowed content and
/// links are shared with the source.
unsafe fn deep_clone(kind: &FieldKind, source: &ValueStorage) -> ValueStorage {
    let mut out = *source;
    match kind {
        FieldKind::Ascii | FieldKind::Unicode | FieldKind::ByteVector => {
            if source.capacity_in_bytes() > 0 {
                let bytes = unsafe { source.array_bytes() };
                if bytes.is_empty() {
                    out.set_capacity_in_bytes(0);
                    out.set(ptr::null::<u8>());
                } else {
                    let buffer = alloc::allocate_bytes(bytes.len());
                    unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), buffer, bytes.len()) };
                    out.set(buffer);
                    out.set_capacity_in_bytes(bytes.len() as u32);
                }
            }
        }
        FieldKind::Group(layout) => {
            let content: *const ValueStorage = source.get();
            if source.owns_content() && !source.is_link() && !content.is_null() {
                out.set(unsafe { clone_block(layout.fields(), content, layout.arity()) });
            }
        }
        FieldKind::Sequence(layout) => {
            let content: *const ValueStorage = source.get();
            if source.capacity_in_bytes() > 0 && !content.is_null() {
                let slots = source.array_length() as usize * layout.arity();
                if slots == 0 {
                    out.set(ptr::null::<ValueStorage>());
                } else {
                    out.set(unsafe { clone_block(layout.fields(), content, slots) });
                }
                out.set_capacity_in_bytes((slots * SLOT_BYTES) as u32);
            }
        }
        FieldKind::TemplateRef => {
            let content = source.template_content();
            if let Some(template) = unsafe { source.template_ptr().as_ref() } {
                if !content.is_null() {
                    let layout = template.layout();
                    out.set(unsafe { clone_block(layout.fields(), content, layout.arity()) });
                }
            }
        }
        _ => {}
    }
    out
}

unsafe fn clone_block(
    fields: &[FieldKind],
    content: *const ValueStorage,
    slots: usize,
) -> *mut ValueStorage {
    let mut block = ValueBlock::new(slots);
    for (idx, slot) in block.iter_mut().enumerate() {
        *slot = unsafe { deep_clone(&fields[idx % fields.len()], &*content.add(idx)) };
    }
    block.into_raw()
}

/// Gives a group an owned subfield block, copying a linked or borrowed one.
unsafe fn own_group(fields: &[FieldKind], value: &mut ValueStorage) {
    let content: *const ValueStorage = value.get();
    if content.is_null() {
        let defaults: Vec<ValueStorage> = fields.iter().map(FieldKind::default_storage).collect();
        value.set(ValueBlock::from_values(&defaults).into_raw());
    } else if !value.owns_content() || value.is_link() {
        value.set(unsafe { clone_block(fields, content, fields.len()) });
    } else {
        return;
    }
    value.set_group_flags(true, false);
}

/// Gives a sequence an owned element block, copying a borrowed one.
unsafe fn own_sequence(fields: &[FieldKind], value: &mut ValueStorage) -> Result<(), ValueError> {
    if value.capacity_in_bytes() > 0 {
        return Ok(());
    }
    let len = value.array_length() as usize;
    let slots = len * fields.len();
    let content: *const ValueStorage = value.get();
    if slots == 0 || content.is_null() {
        value.set(ptr::null::<ValueStorage>());
        return Ok(());
    }
    if slots * SLOT_BYTES > MAX_CAPACITY_IN_BYTES {
        return Err(ValueError::LengthExceedsLimit {
            field: "sequence",
            len,
            max: MAX_CAPACITY_IN_BYTES / (SLOT_BYTES * fields.len()),
        });
    }
    value.set(unsafe { clone_block(fields, content, slots) });
    value.set_capacity_in_bytes((slots * SLOT_BYTES) as u32);
    Ok(())
}
