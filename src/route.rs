//! Route paths.
//!
//! Screens are addressed with the same paths a browser would use, so a route
//! can be given on the command line and round-trips through [`Route::parse`]
//! and `Display`.

use std::fmt;

use crate::model::StudentId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/students?page=N`
    Students { page: u32 },
    /// `/students/add`
    AddStudent,
    /// `/students/{id}`
    EditStudent { id: StudentId },
    NotFound(String),
}

impl Default for Route {
    fn default() -> Self {
        Self::Students { page: 1 }
    }
}

impl Route {
    /// Parses a path with an optional query string.
    ///
    /// ```
    /// use roster::route::Route;
    ///
    /// assert_eq!(Route::parse("/students?page=3"), Route::Students { page: 3 });
    /// assert_eq!(Route::parse("/students?page=abc"), Route::Students { page: 1 });
    /// assert_eq!(Route::parse("/students/add"), Route::AddStudent);
    /// assert_eq!(Route::parse("/students/5"), Route::EditStudent { id: 5 });
    /// ```
    pub fn parse(input: &str) -> Self {
        let (path, query) = input.split_once('?').unwrap_or((input, ""));
        let path = path.trim_end_matches('/');

        match path {
            "" | "/students" => Self::Students {
                page: page_param(query),
            },
            "/students/add" => Self::AddStudent,
            _ => path
                .strip_prefix("/students/")
                .and_then(|id| id.parse().ok())
                .map_or_else(|| Self::NotFound(input.to_string()), |id| Self::EditStudent { id }),
        }
    }
}

/// `page` from a query string; missing, non-numeric or zero means 1.
fn page_param(query: &str) -> u32 {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == "page")
        .and_then(|(_, value)| value.parse().ok())
        .filter(|page| *page > 0)
        .unwrap_or(1)
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Students { page } => write!(f, "/students?page={page}"),
            Self::AddStudent => f.write_str("/students/add"),
            Self::EditStudent { id } => write!(f, "/students/{id}"),
            Self::NotFound(path) => f.write_str(path),
        }
    }
}
