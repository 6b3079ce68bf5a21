use crate::{
    data::{
        DataType,
        course::{Course, NewCourse},
        person::NewPerson,
        student::Student,
        teacher::Teacher,
    },
    error::AcademyResult,
};
use sqlx::SqliteConnection;

const COURSES: [(&str, &str); 3] = [
    ("Mathematics", "Algebra & Calculus"),
    ("Physics", "Mechanics & Electromagnetism"),
    ("Chemistry", "Organic & Inorganic Chemistry"),
];

//(name, email, index into COURSES)
const TEACHERS: [(&str, &str, usize); 4] = [
    ("Dr. Sarah Wilson", "sarah@academy.com", 0),
    ("Mr. John Davis", "john@academy.com", 0),
    ("Prof. Lisa Chen", "lisa@academy.com", 1),
    ("Dr. Raj Patel", "raj@academy.com", 2),
];

const STUDENTS: [(&str, &str, usize); 2] = [
    ("Rahul Kumar", "rahul@student.com", 0),
    ("Priya Singh", "priya@student.com", 1),
];

/// Fills an empty database with sample courses, teachers and students. Does nothing if any
/// course already exists. Returns whether anything was inserted.
pub async fn seed_sample_data(conn: &mut SqliteConnection) -> AcademyResult<bool> {
    if Course::count(&mut *conn).await? > 0 {
        return Ok(false);
    }

    let mut course_ids = Vec::with_capacity(COURSES.len());
    for (name, description) in COURSES {
        let id = Course::insert_into_database(
            NewCourse {
                name: name.to_string(),
                description: Some(description.to_string()),
                teacher_id: None,
            },
            &mut *conn,
        )
        .await?;
        course_ids.push(id);
    }

    for (name, email, course) in TEACHERS {
        Teacher::insert_into_database(
            NewPerson {
                name: name.to_string(),
                email: email.to_string(),
                course_id: course_ids[course],
            },
            &mut *conn,
        )
        .await?;
    }

    for (name, email, course) in STUDENTS {
        Student::insert_into_database(
            NewPerson {
                name: name.to_string(),
                email: email.to_string(),
                course_id: course_ids[course],
            },
            &mut *conn,
        )
        .await?;
    }

    info!(
        courses = COURSES.len(),
        teachers = TEACHERS.len(),
        students = STUDENTS.len(),
        "Seeded sample data"
    );
    Ok(true)
}
