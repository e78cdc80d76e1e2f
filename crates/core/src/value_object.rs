//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**: a tax rate, a price hash or a price
/// table are fully described by their attribute values, and two of them with
/// the same values are interchangeable. They are immutable; "modifying" one
/// produces a new value.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct VersionTag(String);
///
/// impl ValueObject for VersionTag {}
///
/// assert_eq!(VersionTag("7".into()), VersionTag("7".into()));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
