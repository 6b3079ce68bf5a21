use crate::{
    data::{
        DataType,
        person::{NewPerson, Person},
    },
    error::{AcademyResult, MakeQuerySnafu, MissingTeacherSnafu, write_error},
};
use snafu::{ResultExt, ensure};
use sqlx::{FromRow, SqliteConnection};

#[derive(Debug, Clone, FromRow)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub course_id: i64,
    pub course_name: String,
}

impl DataType for Teacher {
    type Id = i64;
    type FormForAdding = NewPerson;

    async fn get_from_db_by_id(id: Self::Id, conn: &mut SqliteConnection) -> AcademyResult<Option<Self>> {
        sqlx::query_as(
            "SELECT t.id, t.name, t.email, t.course_id, c.name AS course_name FROM teacher t JOIN course c ON c.id = t.course_id WHERE t.id = ?",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .context(MakeQuerySnafu)
    }

    async fn get_all(conn: &mut SqliteConnection) -> AcademyResult<Vec<Self>> {
        sqlx::query_as(
            "SELECT t.id, t.name, t.email, t.course_id, c.name AS course_name FROM teacher t JOIN course c ON c.id = t.course_id ORDER BY t.name, t.id",
        )
        .fetch_all(conn)
        .await
        .context(MakeQuerySnafu)
    }

    async fn insert_into_database(
        to_be_added: Self::FormForAdding,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<Self::Id> {
        let NewPerson {
            name,
            email,
            course_id,
        } = to_be_added;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO teacher (name, email, course_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(name)
        .bind(email)
        .bind(course_id)
        .fetch_one(conn)
        .await
        .map_err(write_error)?;
        info!(id, "Inserted teacher");

        Ok(id)
    }

    async fn remove_from_database(id: Self::Id, conn: &mut SqliteConnection) -> AcademyResult<()> {
        let removed = sqlx::query("DELETE FROM teacher WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected();
        ensure!(removed > 0, MissingTeacherSnafu { id });

        info!(id, "Removed teacher");
        Ok(())
    }
}

impl Person for Teacher {
    async fn email_in_use(
        email: &str,
        except: Option<i64>,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM teacher WHERE email = ? AND id IS NOT ?")
                .bind(email)
                .bind(except)
                .fetch_one(conn)
                .await
                .context(MakeQuerySnafu)?;
        Ok(count > 0)
    }

    async fn update_in_database(
        id: i64,
        updated: NewPerson,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<()> {
        let NewPerson {
            name,
            email,
            course_id,
        } = updated;

        let changed = sqlx::query("UPDATE teacher SET name = ?, email = ?, course_id = ? WHERE id = ?")
            .bind(name)
            .bind(email)
            .bind(course_id)
            .bind(id)
            .execute(conn)
            .await
            .map_err(write_error)?
            .rows_affected();
        ensure!(changed > 0, MissingTeacherSnafu { id });

        info!(id, "Updated teacher");
        Ok(())
    }
}

impl Teacher {
    /// Returns whether a teacher with `id` existed to be moved.
    pub async fn reassign_to_course(
        id: i64,
        course_id: i64,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<bool> {
        let changed = sqlx::query("UPDATE teacher SET course_id = ? WHERE id = ?")
            .bind(course_id)
            .bind(id)
            .execute(conn)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected();
        Ok(changed > 0)
    }

    pub async fn count(conn: &mut SqliteConnection) -> AcademyResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM teacher")
            .fetch_one(conn)
            .await
            .context(MakeQuerySnafu)
    }
}
