use crate::{
    data::{
        DataType,
        person::{NewPerson, Person},
    },
    error::{AcademyResult, MakeQuerySnafu, MissingStudentSnafu, write_error},
};
use snafu::{ResultExt, ensure};
use sqlx::{FromRow, SqliteConnection};

macro_rules! select_students {
    ($tail:literal) => {
        concat!(
            "SELECT s.id, s.name, s.email, s.course_id, c.name AS course_name, ",
            "(SELECT group_concat(t.name, ', ') FROM teacher t WHERE t.course_id = s.course_id) AS teachers ",
            "FROM student s JOIN course c ON c.id = s.course_id",
            $tail
        )
    };
}

#[derive(Debug, Clone, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub course_id: i64,
    pub course_name: String,
    pub teachers: Option<String>,
}

impl DataType for Student {
    type Id = i64;
    type FormForAdding = NewPerson;

    async fn get_from_db_by_id(id: Self::Id, conn: &mut SqliteConnection) -> AcademyResult<Option<Self>> {
        sqlx::query_as(select_students!(" WHERE s.id = ?"))
            .bind(id)
            .fetch_optional(conn)
            .await
            .context(MakeQuerySnafu)
    }

    /// Newest first.
    async fn get_all(conn: &mut SqliteConnection) -> AcademyResult<Vec<Self>> {
        sqlx::query_as(select_students!(" ORDER BY s.id DESC"))
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
            "INSERT INTO student (name, email, course_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(name)
        .bind(email)
        .bind(course_id)
        .fetch_one(conn)
        .await
        .map_err(write_error)?;
        info!(id, "Inserted student");

        Ok(id)
    }

    async fn remove_from_database(id: Self::Id, conn: &mut SqliteConnection) -> AcademyResult<()> {
        let removed = sqlx::query("DELETE FROM student WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected();
        ensure!(removed > 0, MissingStudentSnafu { id });

        info!(id, "Removed student");
        Ok(())
    }
}

impl Person for Student {
    async fn email_in_use(
        email: &str,
        except: Option<i64>,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM student WHERE email = ? AND id IS NOT ?")
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

        let changed = sqlx::query("UPDATE student SET name = ?, email = ?, course_id = ? WHERE id = ?")
            .bind(name)
            .bind(email)
            .bind(course_id)
            .bind(id)
            .execute(conn)
            .await
            .map_err(write_error)?
            .rows_affected();
        ensure!(changed > 0, MissingStudentSnafu { id });

        info!(id, "Updated student");
        Ok(())
    }
}

impl Student {
    /// Substring match on name. `%` and `_` in `term` match literally.
    pub async fn search_by_name(term: &str, conn: &mut SqliteConnection) -> AcademyResult<Vec<Self>> {
        let pattern = format!("%{}%", escape_like(term));

        sqlx::query_as(select_students!(" WHERE s.name LIKE ? ESCAPE '\\' ORDER BY s.id DESC"))
            .bind(pattern)
            .fetch_all(conn)
            .await
            .context(MakeQuerySnafu)
    }

    pub async fn count(conn: &mut SqliteConnection) -> AcademyResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM student")
            .fetch_one(conn)
            .await
            .context(MakeQuerySnafu)
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{course::{Course, NewCourse}, teacher::Teacher},
        error::{AcademyError, CommitTransactionSnafu},
        state::AcademyState,
        validation::ValidationError,
    };
    use std::time::Duration;

    async fn setup(conn: &mut SqliteConnection) -> i64 {
        Course::insert_into_database(
            NewCourse {
                name: "Mathematics".into(),
                description: Some("Algebra & Calculus".into()),
                teacher_id: None,
            },
            conn,
        )
        .await
        .expect("insert course")
    }

    fn person(name: &str, email: &str, course_id: i64) -> NewPerson {
        NewPerson {
            name: name.into(),
            email: email.into(),
            course_id,
        }
    }

    #[tokio::test]
    async fn listing_is_newest_first_with_course_and_teachers() {
        let state = AcademyState::in_memory().await;
        let mut conn = state.get_connection().await.expect("conn");
        let maths = setup(&mut conn).await;

        Teacher::insert_into_database(person("Dr. Sarah Wilson", "sarah@academy.com", maths), &mut conn)
            .await
            .expect("insert teacher");
        let first = Student::insert_into_database(person("Rahul Kumar", "rahul@student.com", maths), &mut conn)
            .await
            .expect("insert");
        let second = Student::insert_into_database(person("Priya Singh", "priya@student.com", maths), &mut conn)
            .await
            .expect("insert");

        let all = Student::get_all(&mut conn).await.expect("list");
        assert_eq!(all.iter().map(|s| s.id).collect::<Vec<_>>(), [second, first]);
        assert_eq!(all[0].course_name, "Mathematics");
        assert_eq!(all[0].teachers.as_deref(), Some("Dr. Sarah Wilson"));
    }

    #[tokio::test]
    async fn search_matches_substrings_and_literal_wildcards() {
        let state = AcademyState::in_memory().await;
        let mut conn = state.get_connection().await.expect("conn");
        let maths = setup(&mut conn).await;

        for (name, email) in [
            ("Ana Lee", "ana@x.com"),
            ("Hannah Stone", "hannah@x.com"),
            ("Bob 100%", "bob@x.com"),
        ] {
            Student::insert_into_database(person(name, email, maths), &mut conn)
                .await
                .expect("insert");
        }

        let names = |students: Vec<Student>| students.into_iter().map(|s| s.name).collect::<Vec<_>>();

        assert_eq!(
            names(Student::search_by_name("ann", &mut conn).await.expect("search")),
            ["Hannah Stone"]
        );
        assert_eq!(
            names(Student::search_by_name("an", &mut conn).await.expect("search")),
            ["Hannah Stone", "Ana Lee"]
        );
        assert_eq!(
            names(Student::search_by_name("%", &mut conn).await.expect("search")),
            ["Bob 100%"]
        );
        assert!(
            Student::search_by_name("_n", &mut conn)
                .await
                .expect("search")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn email_in_use_excludes_the_row_being_edited() {
        let state = AcademyState::in_memory().await;
        let mut conn = state.get_connection().await.expect("conn");
        let maths = setup(&mut conn).await;

        let id = Student::insert_into_database(person("Ana Lee", "ana@x.com", maths), &mut conn)
            .await
            .expect("insert");

        assert!(Student::email_in_use("ana@x.com", None, &mut conn).await.expect("query"));
        assert!(!Student::email_in_use("ana@x.com", Some(id), &mut conn).await.expect("query"));
        assert!(!Student::email_in_use("other@x.com", None, &mut conn).await.expect("query"));
        assert!(!Teacher::email_in_use("ana@x.com", None, &mut conn).await.expect("query"));
    }

    #[tokio::test]
    async fn storage_rejects_duplicate_emails_that_skip_the_precheck() {
        let state = AcademyState::in_memory().await;
        let mut conn = state.get_connection().await.expect("conn");
        let maths = setup(&mut conn).await;

        Student::insert_into_database(person("Ana Lee", "ana@x.com", maths), &mut conn)
            .await
            .expect("insert");
        let err = Student::insert_into_database(person("Ana Clone", "ana@x.com", maths), &mut conn)
            .await
            .expect_err("unique constraint");
        assert!(matches!(
            err,
            AcademyError::Validation {
                source: ValidationError::DuplicateEmail
            }
        ));
        assert_eq!(Student::count(&mut conn).await.expect("count"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overlapping_write_transactions_wait_for_each_other() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AcademyState::on_disk(&dir.path().join("academy.db")).await;
        let maths = setup(&mut *state.get_connection().await.expect("conn")).await;

        let mut first = state.get_transaction().await.expect("first tx");
        assert!(!Student::email_in_use("ana@x.com", None, &mut first).await.expect("query"));

        let second = tokio::spawn({
            let state = state.clone();
            async move {
                let mut tx = state.get_transaction().await?;
                let taken = Student::email_in_use("bo@x.com", None, &mut tx).await?;
                Student::insert_into_database(person("Bo Chen", "bo@x.com", maths), &mut tx).await?;
                tx.commit().await.context(CommitTransactionSnafu)?;
                Ok::<_, AcademyError>(taken)
            }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!second.is_finished(), "second writer should wait for the first to commit");

        Student::insert_into_database(person("Ana Lee", "ana@x.com", maths), &mut first)
            .await
            .expect("insert");
        first.commit().await.expect("commit");

        let taken = second
            .await
            .expect("join")
            .expect("second writer succeeds once the first commits");
        assert!(!taken);
        assert_eq!(
            Student::count(&mut *state.get_connection().await.expect("conn"))
                .await
                .expect("count"),
            2
        );
    }

    #[tokio::test]
    async fn update_and_remove_report_missing_rows() {
        let state = AcademyState::in_memory().await;
        let mut conn = state.get_connection().await.expect("conn");
        let maths = setup(&mut conn).await;

        let id = Student::insert_into_database(person("Ana Lee", "ana@x.com", maths), &mut conn)
            .await
            .expect("insert");

        let err = Student::remove_from_database(id + 1, &mut conn)
            .await
            .expect_err("no such row");
        assert!(matches!(err, AcademyError::MissingStudent { .. }));
        let err = Student::update_in_database(id + 1, person("Who", "who@x.com", maths), &mut conn)
            .await
            .expect_err("no such row");
        assert!(matches!(err, AcademyError::MissingStudent { .. }));
        assert_eq!(Student::count(&mut conn).await.expect("count"), 1);

        Student::update_in_database(id, person("Ana Lee", "ana2@x.com", maths), &mut conn)
            .await
            .expect("update");
        let ana = Student::get_from_db_by_id(id, &mut conn)
            .await
            .expect("query")
            .expect("exists");
        assert_eq!(ana.email, "ana2@x.com");

        Student::remove_from_database(id, &mut conn).await.expect("remove");
        assert_eq!(Student::count(&mut conn).await.expect("count"), 0);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like(r"50%_off\"), r"50\%\_off\\");
    }
}
