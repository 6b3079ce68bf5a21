use crate::{
    data::{DataType, course::Course, person::PersonForm, teacher::Teacher},
    error::{AcademyError, AcademyResult, CommitTransactionSnafu},
    flash::{Flash, FlashQuery, Reply},
    maud_conveniences::{link_button, render_table},
    routes::{create_person, person_form, rejected, update_person},
    state::AcademyState,
};
use axum::{
    Form,
    extract::{Path, Query, State},
};
use maud::html;
use snafu::ResultExt;

impl From<&Teacher> for PersonForm {
    fn from(teacher: &Teacher) -> Self {
        Self {
            name: teacher.name.clone(),
            email: teacher.email.clone(),
            course_id: teacher.course_id.to_string(),
        }
    }
}

pub async fn get_teachers(
    State(state): State<AcademyState>,
    Query(flash): Query<FlashQuery>,
) -> AcademyResult<Reply> {
    let flash = flash.into_flash()?;
    let teachers = Teacher::get_all(&mut *state.get_connection().await?).await?;

    let rows = teachers
        .into_iter()
        .map(|teacher| {
            [
                html! {(teacher.name)},
                html! {a href={"mailto:" (teacher.email)} class="text-blue-200 underline" {(teacher.email)}},
                html! {(teacher.course_name)},
                html! {
                    (link_button(&format!("/edit-teacher/{}", teacher.id), "Edit", false))
                    (link_button(&format!("/delete-teacher/{}", teacher.id), "Delete", true))
                },
            ]
        })
        .collect();

    Ok(Reply::Page(state.render(
        flash.as_ref(),
        html! {
            div class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-4xl w-full" {
                (render_table("Teachers", ["Name", "Email", "Course", ""], rows))
            }
        },
    )))
}

pub async fn get_add_teacher(State(state): State<AcademyState>) -> AcademyResult<Reply> {
    let courses = Course::get_all(&mut *state.get_connection().await?).await?;

    Ok(Reply::Page(state.render(
        None,
        person_form("Add Teacher", "/add-teacher", &PersonForm::default(), courses, "Add Teacher"),
    )))
}

pub async fn post_add_teacher(
    State(state): State<AcademyState>,
    Form(form): Form<PersonForm>,
) -> AcademyResult<Reply> {
    let mut tx = state.get_transaction().await?;

    match create_person::<Teacher>(form.clone(), &mut tx).await {
        Ok(_) => {
            tx.commit().await.context(CommitTransactionSnafu)?;
            Reply::redirect("/teachers", &Flash::success("Teacher added successfully!"))
        }
        Err(AcademyError::Validation { source }) => {
            let courses = Course::get_all(&mut tx).await?;
            Ok(rejected(
                &state,
                &source,
                person_form("Add Teacher", "/add-teacher", &form, courses, "Add Teacher"),
            ))
        }
        Err(e) => Err(e),
    }
}

pub async fn get_edit_teacher(
    State(state): State<AcademyState>,
    Path(id): Path<i64>,
) -> AcademyResult<Reply> {
    let mut conn = state.get_connection().await?;
    let Some(teacher) = Teacher::get_from_db_by_id(id, &mut conn).await? else {
        warn!(id, "Tried to edit missing teacher");
        return Reply::redirect("/teachers", &Flash::danger("Teacher not found!"));
    };
    let courses = Course::get_all(&mut conn).await?;

    Ok(Reply::Page(state.render(
        None,
        person_form(
            &format!("Edit {}", teacher.name),
            &format!("/edit-teacher/{id}"),
            &PersonForm::from(&teacher),
            courses,
            "Save Teacher",
        ),
    )))
}

pub async fn post_edit_teacher(
    State(state): State<AcademyState>,
    Path(id): Path<i64>,
    Form(form): Form<PersonForm>,
) -> AcademyResult<Reply> {
    let mut tx = state.get_transaction().await?;
    let Some(teacher) = Teacher::get_from_db_by_id(id, &mut tx).await? else {
        warn!(id, "Tried to edit missing teacher");
        return Reply::redirect("/teachers", &Flash::danger("Teacher not found!"));
    };

    match update_person::<Teacher>(id, form, &mut tx).await {
        Ok(()) => {
            tx.commit().await.context(CommitTransactionSnafu)?;
            Reply::redirect("/teachers", &Flash::success("Teacher updated successfully!"))
        }
        Err(AcademyError::Validation { source }) => {
            let courses = Course::get_all(&mut tx).await?;
            Ok(rejected(
                &state,
                &source,
                person_form(
                    &format!("Edit {}", teacher.name),
                    &format!("/edit-teacher/{id}"),
                    &PersonForm::from(&teacher),
                    courses,
                    "Save Teacher",
                ),
            ))
        }
        Err(e) => Err(e),
    }
}

pub async fn get_delete_teacher(
    State(state): State<AcademyState>,
    Path(id): Path<i64>,
) -> AcademyResult<Reply> {
    let mut tx = state.get_transaction().await?;
    let Some(teacher) = Teacher::get_from_db_by_id(id, &mut tx).await? else {
        warn!(id, "Tried to delete missing teacher");
        return Reply::redirect("/teachers", &Flash::danger("Teacher not found!"));
    };

    Teacher::remove_from_database(id, &mut tx).await?;
    tx.commit().await.context(CommitTransactionSnafu)?;

    Reply::redirect(
        "/teachers",
        &Flash::danger(format!("Teacher \"{}\" deleted!", teacher.name)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::course::NewCourse, data::person::Person};

    fn form(name: &str, email: &str, course_id: i64) -> Form<PersonForm> {
        Form(PersonForm {
            name: name.into(),
            email: email.into(),
            course_id: course_id.to_string(),
        })
    }

    #[tokio::test]
    async fn teacher_crud_mirrors_students() {
        let state = AcademyState::in_memory().await;
        let physics = Course::insert_into_database(
            NewCourse {
                name: "Physics".into(),
                description: None,
                teacher_id: None,
            },
            &mut *state.get_connection().await.expect("conn"),
        )
        .await
        .expect("insert course");

        let reply = post_add_teacher(State(state.clone()), form("Prof. Lisa Chen", "Lisa@Academy.com", physics))
            .await
            .expect("add");
        let (to, flash) = reply.redirect_flash();
        assert_eq!(to, "/teachers");
        assert_eq!(flash, Flash::success("Teacher added successfully!"));

        let teachers = Teacher::get_all(&mut *state.get_connection().await.expect("conn"))
            .await
            .expect("list");
        assert_eq!(teachers.len(), 1);
        assert_eq!(teachers[0].email, "lisa@academy.com");
        let id = teachers[0].id;

        let reply = post_add_teacher(State(state.clone()), form("Lisa Twin", "lisa@academy.com", physics))
            .await
            .expect("handled");
        assert!(matches!(reply, Reply::Rejected(_)));

        let reply = post_edit_teacher(State(state.clone()), Path(id), form("L", "lisa@academy.com", physics))
            .await
            .expect("handled");
        assert!(reply.into_markup().contains("Name must be at least 2 characters long."));

        let reply = post_edit_teacher(State(state.clone()), Path(id), form("Prof. Lisa Chen", "lisa@academy.com", physics))
            .await
            .expect("edit");
        assert_eq!(reply.redirect_flash().1, Flash::success("Teacher updated successfully!"));

        let page = get_teachers(State(state.clone()), Query(FlashQuery::default()))
            .await
            .expect("list")
            .into_markup();
        assert!(page.contains("Prof. Lisa Chen"));
        assert!(page.contains("Physics"));

        let reply = get_delete_teacher(State(state.clone()), Path(id))
            .await
            .expect("delete");
        assert_eq!(
            reply.redirect_flash().1,
            Flash::danger("Teacher \"Prof. Lisa Chen\" deleted!")
        );
        let reply = get_delete_teacher(State(state.clone()), Path(id))
            .await
            .expect("handled");
        assert_eq!(reply.redirect_flash().1, Flash::danger("Teacher not found!"));

        assert!(
            !Teacher::email_in_use("lisa@academy.com", None, &mut *state.get_connection().await.expect("conn"))
                .await
                .expect("query")
        );
    }
}
