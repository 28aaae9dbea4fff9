//! Student records as they travel over the wire and through the form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned student identifier.
pub type StudentId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "Male", alias = "male")]
    Male,
    #[serde(rename = "Female", alias = "female")]
    Female,
    #[default]
    #[serde(rename = "other", alias = "Other", other)]
    Other,
}

impl Gender {
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }

    /// The next option, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Other,
            Self::Other => Self::Male,
        }
    }

    /// The previous option, wrapping around.
    #[must_use]
    pub const fn previous(self) -> Self {
        match self {
            Self::Male => Self::Other,
            Self::Female => Self::Male,
            Self::Other => Self::Female,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stored student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub btc_address: String,
}

/// The editable part of a student: everything except the id.
///
/// This is the form's state and the body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub country: String,
    pub avatar: String,
    pub btc_address: String,
}

impl StudentDraft {
    /// Attaches an id, producing the body of an update request.
    #[must_use]
    pub fn with_id(self, id: StudentId) -> Student {
        Student {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            gender: self.gender,
            country: self.country,
            avatar: self.avatar,
            btc_address: self.btc_address,
        }
    }
}

impl From<&Student> for StudentDraft {
    fn from(student: &Student) -> Self {
        Self {
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            email: student.email.clone(),
            gender: student.gender,
            country: student.country.clone(),
            avatar: student.avatar.clone(),
            btc_address: student.btc_address.clone(),
        }
    }
}

/// One page of a listing plus the total count reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of records across all pages, if the server sent it.
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, total_count: Option<u64>) -> Self {
        Self { items, total_count }
    }
}
