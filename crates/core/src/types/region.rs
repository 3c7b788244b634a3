//! Region types.

use serde::{Deserialize, Serialize};

use super::id::RegionId;

/// A geographic/currency context that every cart must be associated with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    /// Unique identifier for the region.
    pub id: RegionId,
    /// Display name, e.g. "North America".
    pub name: String,
    /// Lowercase ISO 4217 currency code carts in this region use.
    pub currency_code: String,
    /// Countries served by the region.
    #[serde(default)]
    pub countries: Vec<Country>,
}

/// A country within a region, used to populate address forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    /// Two-letter ISO 3166-1 code, lowercase.
    pub iso_2: String,
    /// Human-readable name, when the backend provides one.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Country {
    /// Label for pickers: the display name, falling back to the ISO code.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.iso_2)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_country_label_falls_back_to_iso_code() {
        let named: Country = serde_json::from_str(
            r#"{"iso_2": "us", "display_name": "United States"}"#,
        )
        .unwrap();
        assert_eq!(named.label(), "United States");

        let bare: Country = serde_json::from_str(r#"{"iso_2": "dk"}"#).unwrap();
        assert_eq!(bare.label(), "dk");
    }
}
