use crate::{
    data::{
        DataType,
        course::Course,
        person::PersonForm,
        student::Student,
    },
    error::{AcademyError, AcademyResult, CommitTransactionSnafu},
    flash::{Flash, FlashQuery, Reply},
    maud_conveniences::{INPUT_CLASSES, link_button, render_table},
    routes::{create_person, person_form, rejected, update_person},
    state::AcademyState,
};
use axum::{
    Form,
    extract::{Path, Query, State},
};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::ResultExt;

impl From<&Student> for PersonForm {
    fn from(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            email: student.email.clone(),
            course_id: student.course_id.to_string(),
        }
    }
}

fn students_page(students: Vec<Student>, search: &str) -> Markup {
    let rows = students
        .into_iter()
        .map(|student| {
            [
                html! {(student.name)},
                html! {a href={"mailto:" (student.email)} class="text-blue-200 underline" {(student.email)}},
                html! {(student.course_name)},
                html! {
                    @if let Some(teachers) = student.teachers {
                        (teachers)
                    } @else {
                        span class="italic" {"-"}
                    }
                },
                html! {
                    (link_button(&format!("/edit/{}", student.id), "Edit", false))
                    (link_button(&format!("/delete/{}", student.id), "Delete", true))
                },
            ]
        })
        .collect();

    html! {
        div class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-4xl w-full flex flex-col space-y-4" {
            form method="post" action="/" class="flex flex-row space-x-4" {
                input type="search" name="search" value=(search) placeholder="Search students by name..." class=(INPUT_CLASSES);
                button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded" {"Search"}
                a href="/" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {"Clear"}
            }
            (render_table("Students", ["Name", "Email", "Course", "Teachers", ""], rows))
        }
    }
}

pub async fn get_students(
    State(state): State<AcademyState>,
    Query(flash): Query<FlashQuery>,
) -> AcademyResult<Reply> {
    let flash = flash.into_flash()?;
    let students = Student::get_all(&mut *state.get_connection().await?).await?;

    Ok(Reply::Page(state.render(flash.as_ref(), students_page(students, ""))))
}

#[derive(Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    search: String,
}

pub async fn post_search_students(
    State(state): State<AcademyState>,
    Form(SearchForm { search }): Form<SearchForm>,
) -> AcademyResult<Reply> {
    let search = search.trim();
    let mut conn = state.get_connection().await?;

    let (students, flash) = if search.is_empty() {
        (Vec::new(), Flash::warning("Please enter a search term."))
    } else {
        (
            Student::search_by_name(search, &mut conn).await?,
            Flash::info(format!("Showing results for \"{search}\"")),
        )
    };

    Ok(Reply::Page(state.render(Some(&flash), students_page(students, search))))
}

pub async fn get_add_student(State(state): State<AcademyState>) -> AcademyResult<Reply> {
    let courses = Course::get_all(&mut *state.get_connection().await?).await?;

    Ok(Reply::Page(state.render(
        None,
        person_form("Add Student", "/add", &PersonForm::default(), courses, "Add Student"),
    )))
}

pub async fn post_add_student(
    State(state): State<AcademyState>,
    Form(form): Form<PersonForm>,
) -> AcademyResult<Reply> {
    let mut tx = state.get_transaction().await?;

    match create_person::<Student>(form.clone(), &mut tx).await {
        Ok(_) => {
            tx.commit().await.context(CommitTransactionSnafu)?;
            Reply::redirect("/", &Flash::success("Student added successfully!"))
        }
        Err(AcademyError::Validation { source }) => {
            let courses = Course::get_all(&mut tx).await?;
            Ok(rejected(
                &state,
                &source,
                person_form("Add Student", "/add", &form, courses, "Add Student"),
            ))
        }
        Err(e) => Err(e),
    }
}

pub async fn get_edit_student(
    State(state): State<AcademyState>,
    Path(id): Path<i64>,
) -> AcademyResult<Reply> {
    let mut conn = state.get_connection().await?;
    let Some(student) = Student::get_from_db_by_id(id, &mut conn).await? else {
        warn!(id, "Tried to edit missing student");
        return Reply::redirect("/", &Flash::danger("Student not found!"));
    };
    let courses = Course::get_all(&mut conn).await?;

    Ok(Reply::Page(state.render(
        None,
        person_form(
            &format!("Edit {}", student.name),
            &format!("/edit/{id}"),
            &PersonForm::from(&student),
            courses,
            "Save Student",
        ),
    )))
}

pub async fn post_edit_student(
    State(state): State<AcademyState>,
    Path(id): Path<i64>,
    Form(form): Form<PersonForm>,
) -> AcademyResult<Reply> {
    let mut tx = state.get_transaction().await?;
    let Some(student) = Student::get_from_db_by_id(id, &mut tx).await? else {
        warn!(id, "Tried to edit missing student");
        return Reply::redirect("/", &Flash::danger("Student not found!"));
    };

    match update_person::<Student>(id, form, &mut tx).await {
        Ok(()) => {
            tx.commit().await.context(CommitTransactionSnafu)?;
            Reply::redirect("/", &Flash::success("Student updated successfully!"))
        }
        Err(AcademyError::Validation { source }) => {
            let courses = Course::get_all(&mut tx).await?;
            Ok(rejected(
                &state,
                &source,
                person_form(
                    &format!("Edit {}", student.name),
                    &format!("/edit/{id}"),
                    &PersonForm::from(&student),
                    courses,
                    "Save Student",
                ),
            ))
        }
        Err(e) => Err(e),
    }
}

pub async fn get_delete_student(
    State(state): State<AcademyState>,
    Path(id): Path<i64>,
) -> AcademyResult<Reply> {
    let mut tx = state.get_transaction().await?;
    let Some(student) = Student::get_from_db_by_id(id, &mut tx).await? else {
        warn!(id, "Tried to delete missing student");
        return Reply::redirect("/", &Flash::danger("Student not found!"));
    };

    Student::remove_from_database(id, &mut tx).await?;
    tx.commit().await.context(CommitTransactionSnafu)?;

    Reply::redirect(
        "/",
        &Flash::danger(format!("Student \"{}\" deleted!", student.name)),
    )
}
