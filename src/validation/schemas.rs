//! Schemas for the three record kinds.

use super::{Fields, Invalid, Schema};
use crate::models::{Book, Event, NewUser, Role};

const ROLE_NAMES: [&str; 3] = ["admin", "staff", "member"];

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_CHARS: usize = 6;

impl Schema for NewUser {
    const FIELDS: &'static [&'static str] = &["email", "password", "role"];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, Invalid> {
        Ok(NewUser {
            email: fields.email("email")?,
            password: fields.secret("password", MIN_PASSWORD_CHARS)?,
            role: fields.one_of("role", &ROLE_NAMES, Role::parse)?,
        })
    }
}

impl Schema for Book {
    const FIELDS: &'static [&'static str] = &[
        "title",
        "author",
        "year",
        "genre",
        "isbn",
        "image",
        "description",
        "addedDate",
    ];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, Invalid> {
        Ok(Book {
            id: String::new(),
            title: fields.required_string("title")?,
            author: fields.required_string("author")?,
            year: fields.integer("year")?,
            genre: fields.required_string("genre")?,
            isbn: fields.required_string("isbn")?,
            image: fields.optional_uri("image")?,
            description: fields.optional_string("description")?,
            added_date: fields.iso_timestamp("addedDate")?,
        })
    }
}

impl Schema for Event {
    const FIELDS: &'static [&'static str] = &[
        "title",
        "date",
        "location",
        "image",
        "isUpcoming",
        "description",
    ];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, Invalid> {
        Ok(Event {
            id: String::new(),
            title: fields.required_string("title")?,
            date: fields.timestamp("date")?,
            location: fields.required_string("location")?,
            image: fields.optional_uri("image")?,
            is_upcoming: fields.boolean("isUpcoming")?,
            description: fields.optional_string("description")?,
        })
    }
}
