//! Newtype IDs for type-safe entity references.
//!
//! Every stored entity is keyed by a UUID assigned at creation. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing
//! IDs from different entity types, and that parse untrusted path segments
//! into a typed [`IdError`] instead of a lookup miss.

/// Error returned when a string is not a well-formed entity identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} id: {value:?}")]
pub struct IdError {
    /// Entity kind the identifier was meant for (e.g. "cart").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`uuid::Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `generate()`, `parse()`, `as_uuid()` and `FromStr`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use emporium_core::define_id;
/// define_id!(WidgetId, "widget");
///
/// let id = WidgetId::generate();
/// assert_eq!(WidgetId::parse(&id.to_string()), Ok(id));
/// assert!(WidgetId::parse("not-a-uuid").is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $kind:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random (v4) identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Parse an identifier from untrusted input.
            ///
            /// # Errors
            ///
            /// Returns [`IdError`](crate::IdError) if the input is not a UUID.
            pub fn parse(value: &str) -> ::core::result::Result<Self, $crate::IdError> {
                ::uuid::Uuid::parse_str(value.trim())
                    .map(Self)
                    .map_err(|_| $crate::IdError {
                        kind: $kind,
                        value: value.to_owned(),
                    })
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::postgres::PgHasArrayType for $name {
            fn array_type_info() -> ::sqlx::postgres::PgTypeInfo {
                <::uuid::Uuid as ::sqlx::postgres::PgHasArrayType>::array_type_info()
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <::uuid::Uuid as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <::uuid::Uuid as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(ProductId, "product");
define_id!(CartId, "cart");
define_id!(AccountId, "account");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_uuid() {
        let raw = "0b8f6a3e-5f0c-4a5e-9d4f-2f3c1a7e9b10";
        let id = ProductId::parse(raw).unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = CartId::parse(" 0b8f6a3e-5f0c-4a5e-9d4f-2f3c1a7e9b10 ").unwrap();
        assert_eq!(id.to_string(), "0b8f6a3e-5f0c-4a5e-9d4f-2f3c1a7e9b10");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = CartId::parse("64f1c2ab9e").unwrap_err();
        assert_eq!(err.kind, "cart");
        assert_eq!(err.value, "64f1c2ab9e");
        assert_eq!(err.to_string(), "invalid cart id: \"64f1c2ab9e\"");
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        assert_ne!(AccountId::generate(), AccountId::generate());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ProductId::parse("0b8f6a3e-5f0c-4a5e-9d4f-2f3c1a7e9b10").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0b8f6a3e-5f0c-4a5e-9d4f-2f3c1a7e9b10\"");
    }
}
