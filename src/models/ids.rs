//! Stable arena identifiers.
//!
//! Every cross-reference between domain objects is an id into the owning
//! [`Dataset`](super::Dataset) arena. Ids are assigned in insertion order
//! and never reused.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub usize);

        impl $name {
            /// Arena index.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Job identifier.
    JobId,
    "J"
);
define_id!(
    /// Operation identifier.
    OpId,
    "O"
);
define_id!(
    /// Resource identifier.
    ResourceId,
    "R"
);
define_id!(
    /// Resource group identifier.
    ResourceGroupId,
    "RG"
);
define_id!(
    /// Job group identifier.
    JobGroupId,
    "JG"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(JobId(3).to_string(), "J3");
        assert_eq!(OpId(0).to_string(), "O0");
        assert_eq!(ResourceGroupId(2).to_string(), "RG2");
    }

    #[test]
    fn test_ordering_follows_index() {
        assert!(OpId(1) < OpId(2));
        assert_eq!(ResourceId(4).index(), 4);
    }
}
