use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database identifier.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id!(
    /// Identifier of a booking row, assigned by the store on insert.
    BookingId
);

numeric_id!(
    /// Identifier of a registered user (guest or hotelier).
    UserId
);

numeric_id!(
    /// Identifier of a hotel in the catalog.
    HotelId
);

numeric_id!(
    /// Identifier of a room in the catalog.
    RoomId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_of_different_kinds_keep_their_raw_value() {
        assert_eq!(BookingId::new(42).as_i64(), 42);
        assert_eq!(i64::from(RoomId::new(10)), 10);
        assert_eq!(HotelId::from(5).to_string(), "5");
    }

    #[test]
    fn id_parses_from_query_string_value() {
        let id: UserId = " 17 ".parse().unwrap();
        assert_eq!(id, UserId::new(17));
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn id_serializes_as_plain_number() {
        let json = serde_json::to_string(&BookingId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: BookingId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BookingId::new(42));
    }
}
