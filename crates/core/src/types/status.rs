//! Status and role enums for domain entities.
//!
//! Status values are stored in MySQL `ENUM` columns and travel over the JSON
//! API verbatim, so the serialized forms here are the canonical vocabulary.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Transitions are free-form within this allow-list: an admin may move an
/// order from any status to any other. There is deliberately no state
/// machine here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, awaiting payment capture.
    #[default]
    Pendiente,
    /// Payment captured.
    Pagado,
    /// Shipped to the carrier.
    Enviado,
    /// Delivered to the customer.
    Entregado,
    /// Cancelled.
    Cancelado,
}

impl OrderStatus {
    /// All statuses an admin may assign.
    pub const ALL: [Self; 5] = [
        Self::Pendiente,
        Self::Pagado,
        Self::Enviado,
        Self::Entregado,
        Self::Cancelado,
    ];

    /// The canonical string form stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::Pagado => "pagado",
            Self::Enviado => "enviado",
            Self::Entregado => "entregado",
            Self::Cancelado => "cancelado",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(Self::Pendiente),
            "pagado" => Ok(Self::Pagado),
            "enviado" => Ok(Self::Enviado),
            "entregado" => Ok(Self::Entregado),
            "cancelado" => Ok(Self::Cancelado),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// User role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular storefront customer.
    #[default]
    Customer,
    /// Back-office administrator.
    Admin,
}

impl UserRole {
    /// Whether this role grants access to admin routes.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_roundtrip() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_order_status_rejects_unknown() {
        assert!("devuelto".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
        // Case matters: the DB vocabulary is lowercase
        assert!("Pagado".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Enviado).unwrap();
        assert_eq!(json, "\"enviado\"");
        let parsed: OrderStatus = serde_json::from_str("\"cancelado\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelado);
    }

    #[test]
    fn test_user_role() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Customer.is_admin());
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::Customer.to_string(), "customer");
    }
}
