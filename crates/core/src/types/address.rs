//! Shipping address captured on the checkout form.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A shipping address as typed by the customer.
///
/// All fields are free text. An address is only usable for tax calculation
/// once every field is non-empty after trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub line1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// One field of a [`ShippingAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Name,
    Line1,
    City,
    State,
    PostalCode,
    Country,
}

impl AddressField {
    /// All fields in form order.
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Line1,
        Self::City,
        Self::State,
        Self::PostalCode,
        Self::Country,
    ];
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Line1 => "address",
            Self::City => "city",
            Self::State => "state",
            Self::PostalCode => "postal code",
            Self::Country => "country",
        })
    }
}

impl ShippingAddress {
    /// The value of one field.
    #[must_use]
    pub fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::Name => &self.name,
            AddressField::Line1 => &self.line1,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::PostalCode => &self.postal_code,
            AddressField::Country => &self.country,
        }
    }

    /// Mutable access to one field, for per-keystroke edits.
    pub fn field_mut(&mut self, field: AddressField) -> &mut String {
        match field {
            AddressField::Name => &mut self.name,
            AddressField::Line1 => &mut self.line1,
            AddressField::City => &mut self.city,
            AddressField::State => &mut self.state,
            AddressField::PostalCode => &mut self.postal_code,
            AddressField::Country => &mut self.country,
        }
    }

    /// Fields that are empty after trimming, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<AddressField> {
        AddressField::ALL
            .into_iter()
            .filter(|f| self.field(*f).trim().is_empty())
            .collect()
    }

    /// Whether every field is non-empty after trimming.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        AddressField::ALL
            .into_iter()
            .all(|f| !self.field(f).trim().is_empty())
    }

    /// A copy with every field trimmed.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            line1: self.line1.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ShippingAddress {
        ShippingAddress {
            name: "Ada Lovelace".into(),
            line1: "1 Pike St".into(),
            city: "Seattle".into(),
            state: "WA".into(),
            postal_code: "98101".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn test_complete_address() {
        assert!(complete().is_complete());
        assert!(complete().missing_fields().is_empty());
    }

    #[test]
    fn test_each_blank_field_makes_incomplete() {
        for field in AddressField::ALL {
            let mut address = complete();
            *address.field_mut(field) = "   ".into();
            assert!(!address.is_complete(), "{field} blank should be incomplete");
            assert_eq!(address.missing_fields(), vec![field]);
        }
    }

    #[test]
    fn test_trimmed() {
        let mut address = complete();
        address.city = "  Seattle ".into();
        assert_eq!(address.trimmed().city, "Seattle");
    }
}
