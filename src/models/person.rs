use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub salutation: Option<String>,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub affiliation: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub phone: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub biography: Option<String>,
    pub research_areas: Option<String>,
}

impl Person {
    pub fn name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    /// Name used in letter greetings ("Dear ...:").
    pub fn dear_name(&self) -> String {
        match self.salutation.as_deref().map(str::trim) {
            Some(salutation) if !salutation.is_empty() => {
                format!("{salutation} {}", self.lastname)
            }
            _ => self.name(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreatePerson {
    pub salutation: Option<String>,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub affiliation: Option<String>,
}

/// Profile changes submitted with a confirmation. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePerson {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub affiliation: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub phone: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub biography: Option<String>,
    pub research_areas: Option<String>,
}
