use crate::{
    data::{DataType, teacher::Teacher},
    error::{AcademyError, AcademyResult, MakeQuerySnafu, MissingCourseSnafu, MissingTeacherSnafu},
    validation::{ValidationError, is_long_enough, parse_optional_id},
};
use serde::Deserialize;
use snafu::{OptionExt, ResultExt};
use sqlx::{FromRow, SqliteConnection};
use std::collections::HashMap;

#[derive(Debug, Clone, FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// A course alongside everyone pointing at it.
#[derive(Debug, Clone)]
pub struct CourseSummary {
    pub course: Course,
    pub teachers: Vec<String>,
    pub student_count: i64,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CourseForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub teacher_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub description: Option<String>,
    pub teacher_id: Option<i64>,
}

impl CourseForm {
    pub async fn validate(self, conn: &mut SqliteConnection) -> AcademyResult<NewCourse> {
        let name = self.name.trim().to_string();
        if !is_long_enough(&name) {
            return Err(ValidationError::CourseNameTooShort.into());
        }

        let description = Some(self.description.trim().to_string()).filter(|d| !d.is_empty());

        let teacher_id = parse_optional_id(&self.teacher_id);
        if let Some(id) = teacher_id {
            if Teacher::get_from_db_by_id(id, &mut *conn).await?.is_none() {
                return Err(ValidationError::UnknownTeacher { id }.into());
            }
        }

        Ok(NewCourse {
            name,
            description,
            teacher_id,
        })
    }
}

impl DataType for Course {
    type Id = i64;
    type FormForAdding = NewCourse;

    async fn get_from_db_by_id(id: Self::Id, conn: &mut SqliteConnection) -> AcademyResult<Option<Self>> {
        sqlx::query_as("SELECT id, name, description FROM course WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
            .context(MakeQuerySnafu)
    }

    async fn get_all(conn: &mut SqliteConnection) -> AcademyResult<Vec<Self>> {
        sqlx::query_as("SELECT id, name, description FROM course ORDER BY id")
            .fetch_all(conn)
            .await
            .context(MakeQuerySnafu)
    }

    /// Inserts the course and re-points the chosen teacher at it. Both writes go through `conn`,
    /// so callers hand in a transaction to keep them atomic.
    async fn insert_into_database(
        to_be_added: Self::FormForAdding,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<Self::Id> {
        let NewCourse {
            name,
            description,
            teacher_id,
        } = to_be_added;

        let id: i64 =
            sqlx::query_scalar("INSERT INTO course (name, description) VALUES (?, ?) RETURNING id")
                .bind(&name)
                .bind(description)
                .fetch_one(&mut *conn)
                .await
                .context(MakeQuerySnafu)?;
        info!(id, ?name, "Inserted course");

        if let Some(teacher_id) = teacher_id {
            let reassigned = Teacher::reassign_to_course(teacher_id, id, &mut *conn).await?;
            snafu::ensure!(reassigned, MissingTeacherSnafu { id: teacher_id });
            info!(teacher_id, course_id = id, "Reassigned teacher to new course");
        }

        Ok(id)
    }

    async fn remove_from_database(id: Self::Id, conn: &mut SqliteConnection) -> AcademyResult<()> {
        let course = Self::get_from_db_by_id(id, &mut *conn)
            .await?
            .context(MissingCourseSnafu { id })?;

        let (students, teachers): (i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM student WHERE course_id = ?1), (SELECT COUNT(*) FROM teacher WHERE course_id = ?1)",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .context(MakeQuerySnafu)?;

        if students > 0 || teachers > 0 {
            return Err(AcademyError::CourseInUse {
                name: course.name,
                students,
                teachers,
            });
        }

        sqlx::query("DELETE FROM course WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await
            .context(MakeQuerySnafu)?;

        info!(id, "Removed course");
        Ok(())
    }
}

impl Course {
    pub async fn count(conn: &mut SqliteConnection) -> AcademyResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM course")
            .fetch_one(conn)
            .await
            .context(MakeQuerySnafu)
    }

    pub async fn get_summaries(conn: &mut SqliteConnection) -> AcademyResult<Vec<CourseSummary>> {
        let courses = Self::get_all(&mut *conn).await?;

        let mut teachers_by_course: HashMap<i64, Vec<String>> = HashMap::new();
        for teacher in Teacher::get_all(&mut *conn).await? {
            teachers_by_course
                .entry(teacher.course_id)
                .or_default()
                .push(teacher.name);
        }

        let student_counts: HashMap<i64, i64> =
            sqlx::query_as::<_, (i64, i64)>("SELECT course_id, COUNT(*) FROM student GROUP BY course_id")
                .fetch_all(&mut *conn)
                .await
                .context(MakeQuerySnafu)?
                .into_iter()
                .collect();

        Ok(courses
            .into_iter()
            .map(|course| CourseSummary {
                teachers: teachers_by_course.remove(&course.id).unwrap_or_default(),
                student_count: student_counts.get(&course.id).copied().unwrap_or(0),
                course,
            })
            .collect())
    }
}
