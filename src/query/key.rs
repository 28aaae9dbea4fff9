use std::fmt;

use crate::model::StudentId;

/// Identifies one cached response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// One page of the students listing.
    Students { page: u32 },
    /// A single student record.
    Student { id: StudentId },
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Students { page } => write!(f, "students/{page}"),
            Self::Student { id } => write!(f, "student/{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(QueryKey::Students { page: 2 }.to_string(), "students/2");
        assert_eq!(QueryKey::Student { id: 5 }.to_string(), "student/5");
    }

    #[test]
    fn test_page_and_record_keys_differ() {
        assert_ne!(QueryKey::Students { page: 5 }, QueryKey::Student { id: 5 });
    }
}
