use crate::{
    data::{DataType, course::Course},
    error::AcademyResult,
    validation::{ValidationError, is_long_enough, is_valid_email, normalise_email, parse_optional_id},
};
use serde::Deserialize;
use sqlx::SqliteConnection;

/// Students and teachers share a shape: a name, a unique email and the course they belong to.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PersonForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub course_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub email: String,
    pub course_id: i64,
}

#[allow(async_fn_in_trait)]
pub trait Person: DataType<Id = i64, FormForAdding = NewPerson> {
    /// Whether any other row already uses `email`, ignoring the row `except` when editing.
    async fn email_in_use(
        email: &str,
        except: Option<i64>,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<bool>;

    async fn update_in_database(
        id: i64,
        updated: NewPerson,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<()>;
}

impl PersonForm {
    /// Checks run in order and the first failure wins: name length, email format, course choice,
    /// then email uniqueness against every row except `editing`.
    pub async fn validate<P: Person>(
        self,
        editing: Option<i64>,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<NewPerson> {
        let name = self.name.trim().to_string();
        if !is_long_enough(&name) {
            return Err(ValidationError::NameTooShort.into());
        }

        let email = normalise_email(&self.email);
        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail.into());
        }

        let course_id =
            parse_optional_id(&self.course_id).ok_or(ValidationError::NoCourseSelected)?;
        if Course::get_from_db_by_id(course_id, &mut *conn)
            .await?
            .is_none()
        {
            return Err(ValidationError::UnknownCourse { id: course_id }.into());
        }

        if P::email_in_use(&email, editing, &mut *conn).await? {
            return Err(ValidationError::DuplicateEmail.into());
        }

        Ok(NewPerson {
            name,
            email,
            course_id,
        })
    }
}
