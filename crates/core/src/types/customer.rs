//! Customer profile types.

use serde::{Deserialize, Serialize};

use super::id::{AddressId, CustomerId};

/// An authenticated customer's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier for the customer.
    pub id: CustomerId,
    /// Login email.
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Saved address book entries.
    #[serde(default)]
    pub addresses: Vec<CustomerAddress>,
}

impl Customer {
    /// Display name assembled from the optional name parts.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut name = String::new();
        if let Some(first) = &self.first_name {
            name.push_str(first);
        }
        if let Some(last) = &self.last_name {
            if !name.is_empty() {
                name.push(' ');
            }
            name.push_str(last);
        }
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

/// A saved address book entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAddress {
    /// Unique identifier for the address.
    pub id: AddressId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address_1: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Payload for creating the customer profile during registration.
#[derive(Debug, Clone, Serialize)]
pub struct NewCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Partial profile patch. Only set fields are serialized.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer(first: Option<&str>, last: Option<&str>) -> Customer {
        Customer {
            id: CustomerId::new("cus_01"),
            email: "customer@example.com".to_owned(),
            first_name: first.map(str::to_owned),
            last_name: last.map(str::to_owned),
            phone: None,
            addresses: Vec::new(),
        }
    }

    #[test]
    fn test_display_name_joins_parts() {
        assert_eq!(customer(Some("Ada"), Some("Byron")).display_name(), "Ada Byron");
        assert_eq!(customer(Some("Ada"), None).display_name(), "Ada");
        assert_eq!(customer(None, Some("Byron")).display_name(), "Byron");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(customer(None, None).display_name(), "customer@example.com");
    }
}
