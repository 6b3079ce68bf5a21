use crate::validation::ValidationError;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use snafu::Snafu;
use std::str::ParseBoolError;

pub type AcademyResult<T> = Result<T, AcademyError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AcademyError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error commiting SQL transaction"))]
    CommitTransaction { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a bool", name))]
    ParseBool {
        source: ParseBoolError,
        name: &'static str,
    },
    #[snafu(display("Error serialising with rmp_serde"))]
    RmpSerdeEncode { source: rmp_serde::encode::Error },
    #[snafu(display("Error deserialising with rmp_serde"))]
    RmpSerdeDecode { source: rmp_serde::decode::Error },
    #[snafu(display("Error decoding Base64"))]
    B64 { source: base64::DecodeError },
    #[snafu(display("Unable to find student with ID: {}", id))]
    MissingStudent { id: i64 },
    #[snafu(display("Unable to find teacher with ID: {}", id))]
    MissingTeacher { id: i64 },
    #[snafu(display("Unable to find course with ID: {}", id))]
    MissingCourse { id: i64 },
    #[snafu(display("{source}"))]
    Validation { source: ValidationError },
    #[snafu(display(
        "Course {:?} still has {} student(s) and {} teacher(s) assigned",
        name,
        students,
        teachers
    ))]
    CourseInUse {
        name: String,
        students: i64,
        teachers: i64,
    },
}

impl From<ValidationError> for AcademyError {
    fn from(source: ValidationError) -> Self {
        Self::Validation { source }
    }
}

/// Maps a failed write, turning a unique-constraint violation into the user-facing
/// duplicate email error so racing inserts surface the same way the pre-check does.
pub fn write_error(source: sqlx::Error) -> AcademyError {
    match &source {
        sqlx::Error::Database(db) if db.is_unique_violation() => AcademyError::Validation {
            source: ValidationError::DuplicateEmail,
        },
        _ => AcademyError::MakeQuery { source },
    }
}

impl AcademyError {
    pub fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        match self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MigrateError { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            Self::CommitTransaction { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParseBool { .. } => ISE,
            Self::RmpSerdeEncode { .. } => ISE,
            Self::RmpSerdeDecode { .. } | Self::B64 { .. } => BI,
            Self::MissingStudent { .. } | Self::MissingTeacher { .. } | Self::MissingCourse { .. } => NF,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::CourseInUse { .. } => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AcademyError {
    fn into_response(self) -> Response {
        let basic_error = |desc| {
            html! {
                div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                    strong class="font-bold" {"Academy Error "}
                    span {(desc)}
                }
            }
        };

        let status_code = self.status_code();
        error!(?self, %status_code, "Error!");
        (status_code, Html(basic_error(self.to_string()))).into_response()
    }
}
