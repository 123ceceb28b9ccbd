//! Newtype IDs for type-safe row references.
//!
//! Every table in the hosted data service keys its rows by UUID. The
//! `define_id!` macro wraps `Uuid` so a crop ID can never be passed where a
//! user ID is expected.

/// Macro to define a type-safe UUID wrapper.
///
/// Creates a newtype wrapper around `Uuid` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_uuid()`
/// - `Display`, `FromStr`, `From<Uuid>` and `Into<Uuid>` implementations
///
/// # Example
///
/// ```rust
/// # use rain_advisory_core::define_id;
/// define_id!(FieldId);
/// define_id!(StationId);
///
/// let field = FieldId::new(uuid::Uuid::nil());
/// let station = StationId::new(uuid::Uuid::nil());
///
/// // These are different types, so this won't compile:
/// // let _: FieldId = station;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Create a new ID from a UUID value.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Get the underlying UUID value.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s).map(Self)
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
    };
}

// Identity issued by the session provider (auth.users.id)
define_id!(UserId);

// Row IDs, one per table
define_id!(ProfileId);
define_id!(RoleAssignmentId);
define_id!(CropId);
define_id!(AdvisoryId);
define_id!(AlertId);
define_id!(RainfallRecordId);
define_id!(WeatherObservationId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_display_matches_hyphenated_uuid() {
        let raw = Uuid::parse_str("6f1c1f0e-2d7a-4c1b-9a57-3c0c5e0f9b11").unwrap();
        let id = UserId::new(raw);
        assert_eq!(id.to_string(), "6f1c1f0e-2d7a-4c1b-9a57-3c0c5e0f9b11");
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("not-a-uuid".parse::<UserId>().is_err());
        let id: UserId = "6f1c1f0e-2d7a-4c1b-9a57-3c0c5e0f9b11".parse().unwrap();
        assert_eq!(Uuid::from(id).get_version_num(), 4);
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = CropId::new(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
