use regex::Regex;
use snafu::Snafu;
use std::sync::LazyLock;

pub const MIN_NAME_LEN: usize = 2;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// Problems with a submitted form that are reported back to the user instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ValidationError {
    #[snafu(display("Name must be at least 2 characters long."))]
    NameTooShort,
    #[snafu(display("Course name must be at least 2 characters long."))]
    CourseNameTooShort,
    #[snafu(display("Please enter a valid email address."))]
    InvalidEmail,
    #[snafu(display("Please select a course."))]
    NoCourseSelected,
    #[snafu(display("Selected course does not exist."))]
    UnknownCourse { id: i64 },
    #[snafu(display("Selected teacher does not exist."))]
    UnknownTeacher { id: i64 },
    #[snafu(display("Email already exists! Please use a different email."))]
    DuplicateEmail,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_long_enough(name: &str) -> bool {
    name.trim().chars().count() >= MIN_NAME_LEN
}

/// Parses an optional id out of a `<select>`, where the empty option means nothing was chosen.
pub fn parse_optional_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else {
        raw.parse().ok()
    }
}
