//! Sensitive-field tagging and discovery.
//!
//! # Responsibilities
//!
//! - Define the [`SensitiveFields`] trait a record type implements (usually via
//!   `#[derive(SensitiveFields)]` and `#[encrypted]` field attributes) to list
//!   the fields that must be stored encrypted.
//! - Describe each such field with a [`SensitiveField`] accessor.
//! - Cache the discovered descriptors per record type in [`FieldCache`].
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** This module must not import anything from
//!   `crate::crypto`; it only decides *which* strings get transformed.
//! - The `#[encrypted]` marker is the only signal. Field names never are.

pub mod cache;

pub use cache::FieldCache;

/// A record type with fields marked for transparent encryption.
///
/// Implemented by `#[derive(SensitiveFields)]`:
///
/// ```
/// use fieldseal::SensitiveFields;
///
/// #[derive(SensitiveFields)]
/// struct Customer {
///     id: u64,
///     #[encrypted]
///     email: String,
///     #[encrypted]
///     phone: Option<String>,
/// }
/// ```
///
/// It can also be written by hand, which acts as an explicit registration of
/// the type's sensitive field accessors.
pub trait SensitiveFields: Sized + 'static {
    /// Return one descriptor per sensitive field, in declaration order.
    ///
    /// Called at most a handful of times per type; the result is cached by
    /// [`FieldCache`].
    fn sensitive_fields() -> Vec<SensitiveField<Self>>;
}

/// Accessor signature for a sensitive field. Returns `None` when the field
/// currently holds no value.
pub type FieldAccessor<R> = fn(&mut R) -> Option<&mut String>;

/// Descriptor for one sensitive field of record type `R`.
pub struct SensitiveField<R> {
    name: &'static str,
    accessor: FieldAccessor<R>,
}

impl<R> SensitiveField<R> {
    /// Create a descriptor for the field `name` reached through `accessor`.
    pub fn new(name: &'static str, accessor: FieldAccessor<R>) -> Self {
        Self { name, accessor }
    }

    /// The field's name as declared on the record type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Borrow the field's string slot inside `record`.
    pub fn slot<'a>(&self, record: &'a mut R) -> Option<&'a mut String> {
        (self.accessor)(record)
    }
}

impl<R> Clone for SensitiveField<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for SensitiveField<R> {}

impl<R> std::fmt::Debug for SensitiveField<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveField").field("name", &self.name).finish()
    }
}

/// Field types that may carry the `#[encrypted]` marker.
pub trait TaggedSlot {
    /// Borrow the underlying string, if any.
    fn slot(&mut self) -> Option<&mut String>;
}

impl TaggedSlot for String {
    fn slot(&mut self) -> Option<&mut String> {
        Some(self)
    }
}

impl TaggedSlot for Option<String> {
    fn slot(&mut self) -> Option<&mut String> {
        self.as_mut()
    }
}
