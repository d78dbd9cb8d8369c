use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_impl {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_impl!(UserId);
id_impl!(ChatId);
id_impl!(MessageId);
id_impl!(PostId);
id_impl!(CommentId);
id_impl!(
    /// One live transport session. The addressing unit for delivery.
    ConnectionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_time_ordered() {
        let a = ChatId::new();
        let b = ChatId::new();
        assert!(a < b);
    }

    #[test]
    fn id_parses_both_uuid_forms() {
        let id = UserId::new();
        let simple: UserId = id.0.simple().to_string().parse().unwrap();
        let hyphenated: UserId = id.to_string().parse().unwrap();
        assert_eq!(simple, id);
        assert_eq!(hyphenated, id);
    }

    #[test]
    fn id_serializes_as_plain_uuid() {
        let id = PostId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
