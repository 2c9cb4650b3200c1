//! The exported contact record

use serde::{Deserialize, Serialize};

/// Column names of the exported table, in field order
pub const COLUMNS: [&str; 6] = ["name", "phone", "fax", "email", "website", "address"];

/// Contact details of one exhibitor, as extracted from its detail page
///
/// Every field is always present; anything the page did not provide is an
/// empty string so that every exported row has the same six columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    pub phone: String,
    pub fax: String,
    pub email: String,
    pub website: String,
    pub address: String,
}

impl CompanyRecord {
    /// Returns the field values in column order
    pub fn as_row(&self) -> [&str; 6] {
        [
            &self.name,
            &self.phone,
            &self.fax,
            &self.email,
            &self.website,
            &self.address,
        ]
    }

    /// Returns true if no contact field (everything except the name) was found
    pub fn has_no_contact_details(&self) -> bool {
        self.as_row()[1..].iter().all(|value| value.is_empty())
    }
}
