use crate::{
    data::{
        course::Course,
        person::{Person, PersonForm},
    },
    error::AcademyResult,
    flash::{Flash, Reply},
    maud_conveniences::{card, form_submit_button, select_element, simple_form_element, title},
    state::AcademyState,
    validation::{ValidationError, parse_optional_id},
};
use maud::{Markup, html};
use sqlx::SqliteConnection;

pub mod courses;
pub mod students;
pub mod teachers;

pub async fn create_person<P: Person>(
    form: PersonForm,
    conn: &mut SqliteConnection,
) -> AcademyResult<i64> {
    let new_person = form.validate::<P>(None, &mut *conn).await?;
    P::insert_into_database(new_person, conn).await
}

pub async fn update_person<P: Person>(
    id: i64,
    form: PersonForm,
    conn: &mut SqliteConnection,
) -> AcademyResult<()> {
    let updated = form.validate::<P>(Some(id), &mut *conn).await?;
    P::update_in_database(id, updated, conn).await
}

pub fn person_form(
    heading: &str,
    action: &str,
    values: &PersonForm,
    courses: Vec<Course>,
    submit: &'static str,
) -> Markup {
    let selected = parse_optional_id(&values.course_id);

    card(html! {
        (title(heading))
        @if courses.is_empty() {
            p class="italic text-gray-300 mb-4" {
                "There are no courses yet. "
                a href="/add-course" class="text-blue-300 underline" {"Add a course"}
                " first."
            }
        } @else {
            form method="post" action=(action) {
                (simple_form_element("name", "Name", true, None, Some(values.name.as_str())))
                (simple_form_element("email", "Email", true, Some("email"), Some(values.email.as_str())))
                (select_element(
                    "course_id",
                    "Course",
                    Some("Select a Course"),
                    courses.into_iter().map(|course| (course.id, course.name)),
                    selected,
                ))
                (form_submit_button(Some(submit)))
            }
        }
    })
}

/// The form again, with the reason it was turned down shown above it.
pub fn rejected(state: &AcademyState, error: &ValidationError, form: Markup) -> Reply {
    warn!(%error, "Rejected form submission");
    Reply::Rejected(state.render(Some(&Flash::danger(error.to_string())), form))
}
