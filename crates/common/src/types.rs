use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Defines a UUID-backed identifier newtype.
///
/// Wrapping the raw UUID prevents mixing up the many identifier kinds this
/// domain carries (products, orders, items, shipments, profiles, users).
macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of a catalog product.
    ProductId
}

define_id! {
    /// Identifier of an order.
    OrderId
}

define_id! {
    /// Identifier of a single order line item.
    OrderItemId
}

define_id! {
    /// Identifier of a shipment.
    ShipmentId
}

define_id! {
    /// Identifier of a logistics provider.
    ProviderId
}

define_id! {
    /// Identifier of a business profile (buyer and/or seller account).
    ProfileId
}

define_id! {
    /// Identifier of a user.
    UserId
}

define_id! {
    /// Identifier of a stock audit log entry.
    StockLogId
}

/// The identity a mutating operation acts as: a user together with the
/// business profile the user is acting for.
///
/// The acting profile is always an explicit input; the core never guesses
/// which of a user's profiles is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The authenticated user (opaque, trusted as handed in).
    pub user: UserId,
    /// The business profile the user is acting for.
    pub profile: ProfileId,
}

impl Actor {
    /// Creates an actor for the given user and acting profile.
    pub fn new(user: UserId, profile: ProfileId) -> Self {
        Self { user, profile }
    }
}
