use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type Id = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Error returned when a stored enum column holds an unknown spelling
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a text-backed enum whose serde and database spellings match.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Kind of catalog entry
    ItemType {
        Part => "Part",
        Material => "Material",
        Tool => "Tool",
        Consumable => "Consumable",
        Service => "Service",
    }
}

text_enum! {
    /// How an item is replenished
    ReplenishmentSystem {
        Buy => "Buy",
        Make => "Make",
        BuyAndMake => "Buy and Make",
    }
}

text_enum! {
    /// How a material line is sourced when a job is built
    MethodType {
        Buy => "Buy",
        Make => "Make",
        Pick => "Pick",
    }
}

text_enum! {
    /// Lifecycle of a make method version
    MakeMethodStatus {
        Draft => "Draft",
        Active => "Active",
        Archived => "Archived",
    }
}

text_enum! {
    /// Catalog entity types that can carry an external integration mapping
    EntityType {
        Item => "item",
    }
}

text_enum! {
    /// CAD system a BOM payload originates from; doubles as the integration name
    SyncSource {
        Onshape => "onshape",
    }
}
