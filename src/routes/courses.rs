use crate::{
    data::{
        DataType,
        course::{Course, CourseForm},
        teacher::Teacher,
    },
    error::{AcademyError, AcademyResult, CommitTransactionSnafu},
    flash::{Flash, FlashQuery, Reply},
    maud_conveniences::{
        INPUT_CLASSES, card, form_element, form_submit_button, link_button, render_table,
        select_element, simple_form_element, title,
    },
    routes::rejected,
    state::AcademyState,
    validation::parse_optional_id,
};
use axum::{
    Form,
    extract::{Path, Query, State},
};
use maud::{Markup, html};
use snafu::ResultExt;

pub async fn get_courses(
    State(state): State<AcademyState>,
    Query(flash): Query<FlashQuery>,
) -> AcademyResult<Reply> {
    let flash = flash.into_flash()?;
    let summaries = Course::get_summaries(&mut *state.get_connection().await?).await?;

    let rows = summaries
        .into_iter()
        .map(|summary| {
            [
                html! {(summary.course.name)},
                html! {
                    @if let Some(description) = summary.course.description {
                        (description)
                    } @else {
                        span class="italic" {"-"}
                    }
                },
                html! {
                    @if summary.teachers.is_empty() {
                        span class="italic" {"-"}
                    } @else {
                        ul {
                            @for teacher in summary.teachers {
                                li {(teacher)}
                            }
                        }
                    }
                },
                html! {(summary.student_count)},
                link_button(&format!("/delete-course/{}", summary.course.id), "Delete", true),
            ]
        })
        .collect();

    Ok(Reply::Page(state.render(
        flash.as_ref(),
        html! {
            div class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-4xl w-full" {
                (render_table("Courses", ["Name", "Description", "Teachers", "Students", ""], rows))
            }
        },
    )))
}

fn course_form(values: &CourseForm, teachers: Vec<Teacher>) -> Markup {
    card(html! {
        (title("Add Course"))
        form method="post" action="/add-course" {
            (simple_form_element("name", "Name", true, None, Some(values.name.as_str())))
            (form_element("description", "Description (optional)", html! {
                textarea id="description" name="description" rows="3" class=(INPUT_CLASSES) {(values.description)}
            }))
            (select_element(
                "teacher_id",
                "Assign Teacher (optional)",
                Some("No teacher"),
                teachers
                    .into_iter()
                    .map(|teacher| (teacher.id, format!("{} ({})", teacher.name, teacher.course_name))),
                parse_optional_id(&values.teacher_id),
            ))
            (form_submit_button(Some("Add Course")))
        }
    })
}

pub async fn get_add_course(State(state): State<AcademyState>) -> AcademyResult<Reply> {
    let teachers = Teacher::get_all(&mut *state.get_connection().await?).await?;

    Ok(Reply::Page(
        state.render(None, course_form(&CourseForm::default(), teachers)),
    ))
}

/// Creates the course and moves the chosen teacher onto it inside one transaction, so a failure
/// part-way leaves neither change behind.
pub async fn post_add_course(
    State(state): State<AcademyState>,
    Form(form): Form<CourseForm>,
) -> AcademyResult<Reply> {
    let mut tx = state.get_transaction().await?;

    let new_course = match form.clone().validate(&mut tx).await {
        Ok(new_course) => new_course,
        Err(AcademyError::Validation { source }) => {
            let teachers = Teacher::get_all(&mut tx).await?;
            return Ok(rejected(&state, &source, course_form(&form, teachers)));
        }
        Err(e) => return Err(e),
    };
    let assigned_teacher = new_course.teacher_id.is_some();

    Course::insert_into_database(new_course, &mut tx).await?;
    tx.commit().await.context(CommitTransactionSnafu)?;

    let message = if assigned_teacher {
        "Course added with teacher assignment!"
    } else {
        "Course added!"
    };
    Reply::redirect("/courses", &Flash::success(message))
}

pub async fn get_delete_course(
    State(state): State<AcademyState>,
    Path(id): Path<i64>,
) -> AcademyResult<Reply> {
    let mut tx = state.get_transaction().await?;
    let Some(course) = Course::get_from_db_by_id(id, &mut tx).await? else {
        warn!(id, "Tried to delete missing course");
        return Reply::redirect("/courses", &Flash::danger("Course not found!"));
    };

    match Course::remove_from_database(id, &mut tx).await {
        Ok(()) => {
            tx.commit().await.context(CommitTransactionSnafu)?;
            Reply::redirect(
                "/courses",
                &Flash::danger(format!("Course \"{}\" deleted!", course.name)),
            )
        }
        Err(e @ AcademyError::CourseInUse { .. }) => {
            warn!(id, %e, "Refused to delete course in use");
            Reply::redirect("/courses", &Flash::danger(e.to_string()))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::person::PersonForm,
        flash::FlashLevel,
        routes::teachers::post_add_teacher,
    };

    fn course(name: &str, teacher_id: &str) -> Form<CourseForm> {
        Form(CourseForm {
            name: name.into(),
            description: String::new(),
            teacher_id: teacher_id.into(),
        })
    }

    async fn course_id(state: &AcademyState, name: &str) -> i64 {
        Course::get_all(&mut *state.get_connection().await.expect("conn"))
            .await
            .expect("list")
            .into_iter()
            .find(|course| course.name == name)
            .expect("course exists")
            .id
    }

    #[tokio::test]
    async fn teacher_follows_newly_created_course() {
        let state = AcademyState::in_memory().await;

        let reply = post_add_course(State(state.clone()), course("Physics", ""))
            .await
            .expect("add");
        assert_eq!(reply.redirect_flash().1, Flash::success("Course added!"));
        let physics = course_id(&state, "Physics").await;

        post_add_teacher(
            State(state.clone()),
            Form(PersonForm {
                name: "Prof. Lisa Chen".into(),
                email: "lisa@academy.com".into(),
                course_id: physics.to_string(),
            }),
        )
        .await
        .expect("add teacher");

        let page = get_courses(State(state.clone()), Query(FlashQuery::default()))
            .await
            .expect("list")
            .into_markup();
        assert!(page.contains("Prof. Lisa Chen"));

        let teacher = Teacher::get_all(&mut *state.get_connection().await.expect("conn"))
            .await
            .expect("list")
            .remove(0);
        assert_eq!(teacher.course_id, physics);

        let reply = post_add_course(
            State(state.clone()),
            course("Astrophysics", &teacher.id.to_string()),
        )
        .await
        .expect("add");
        let (to, flash) = reply.redirect_flash();
        assert_eq!(to, "/courses");
        assert_eq!(flash, Flash::success("Course added with teacher assignment!"));

        let astro = course_id(&state, "Astrophysics").await;
        let teacher = Teacher::get_from_db_by_id(teacher.id, &mut *state.get_connection().await.expect("conn"))
            .await
            .expect("query")
            .expect("teacher exists");
        assert_eq!(teacher.course_id, astro);
    }

    #[tokio::test]
    async fn unknown_teacher_is_rejected_and_nothing_is_written() {
        let state = AcademyState::in_memory().await;

        let reply = post_add_course(State(state.clone()), course("Physics", "77"))
            .await
            .expect("handled");
        assert!(matches!(reply, Reply::Rejected(_)));
        assert!(reply.into_markup().contains("Selected teacher does not exist."));

        let reply = post_add_course(State(state.clone()), course("P", ""))
            .await
            .expect("handled");
        assert!(
            reply
                .into_markup()
                .contains("Course name must be at least 2 characters long.")
        );

        assert_eq!(
            Course::count(&mut *state.get_connection().await.expect("conn"))
                .await
                .expect("count"),
            0
        );
    }

    #[tokio::test]
    async fn deleting_courses_respects_references() {
        let state = AcademyState::in_memory().await;
        post_add_course(State(state.clone()), course("Physics", ""))
            .await
            .expect("add");
        post_add_course(State(state.clone()), course("Latin", ""))
            .await
            .expect("add");
        let physics = course_id(&state, "Physics").await;
        let latin = course_id(&state, "Latin").await;

        post_add_teacher(
            State(state.clone()),
            Form(PersonForm {
                name: "Prof. Lisa Chen".into(),
                email: "lisa@academy.com".into(),
                course_id: physics.to_string(),
            }),
        )
        .await
        .expect("add teacher");

        let (_, flash) = get_delete_course(State(state.clone()), Path(physics))
            .await
            .expect("handled")
            .redirect_flash();
        assert_eq!(flash.level, FlashLevel::Danger);
        assert!(flash.message.contains("still has 0 student(s) and 1 teacher(s)"));

        let (_, flash) = get_delete_course(State(state.clone()), Path(latin))
            .await
            .expect("handled")
            .redirect_flash();
        assert_eq!(flash.message, "Course \"Latin\" deleted!");

        let (_, flash) = get_delete_course(State(state.clone()), Path(latin))
            .await
            .expect("handled")
            .redirect_flash();
        assert_eq!(flash.message, "Course not found!");

        assert_eq!(
            Course::count(&mut *state.get_connection().await.expect("conn"))
                .await
                .expect("count"),
            1
        );
    }
}
