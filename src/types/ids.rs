//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed ID newtype wrapper.
///
/// Generates: struct, `from_string()`, `as_str()`, Display, Serialize, Deserialize.
/// Optionally generates `new()` (UUID v4) and `Default` if `uuid` flag is passed.
macro_rules! define_id {
    ($name:ident, uuid) => {
        define_id!($name);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().simple().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: String) -> Result<Self, &'static str> {
                if s.is_empty() {
                    return Err(concat!(stringify!($name), " cannot be empty"));
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// Correlates the log lines of one invocation.
define_id!(InvocationId, uuid);
// Issued by the automation engine, never generated here.
define_id!(SessionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_ids_are_unique() {
        assert_ne!(InvocationId::new(), InvocationId::new());
    }

    #[test]
    fn test_session_id_rejects_empty() {
        assert!(SessionId::from_string(String::new()).is_err());
        let id = SessionId::from_string("s-1".to_string()).unwrap();
        assert_eq!(id.as_str(), "s-1");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("s-1"));
    }
}
