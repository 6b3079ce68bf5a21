#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else, clippy::missing_errors_doc)]

use crate::{
    config::RuntimeConfiguration,
    data::{course::Course, seed::seed_sample_data, student::Student, teacher::Teacher},
    error::CommitTransactionSnafu,
    routes::{
        courses::{get_add_course, get_courses, get_delete_course, post_add_course},
        students::{
            get_add_student, get_delete_student, get_edit_student, get_students,
            post_add_student, post_edit_student, post_search_students,
        },
        teachers::{
            get_add_teacher, get_delete_teacher, get_edit_teacher, get_teachers,
            post_add_teacher, post_edit_teacher,
        },
    },
    state::AcademyState,
};
use axum::{Router, routing::get};
use snafu::ResultExt;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::{net::TcpListener, signal};
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod error;
mod flash;
mod maud_conveniences;
mod routes;
mod state;
mod validation;

async fn shutdown_signal(state: AcademyState) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
    state.sensible_shutdown().await;
}

pub fn router(state: AcademyState) -> Router {
    Router::new()
        .route("/", get(get_students).post(post_search_students))
        .route("/add", get(get_add_student).post(post_add_student))
        .route("/edit/{id}", get(get_edit_student).post(post_edit_student))
        .route("/delete/{id}", get(get_delete_student))
        .route("/teachers", get(get_teachers))
        .route("/add-teacher", get(get_add_teacher).post(post_add_teacher))
        .route(
            "/edit-teacher/{id}",
            get(get_edit_teacher).post(post_edit_teacher),
        )
        .route("/delete-teacher/{id}", get(get_delete_teacher))
        .route("/courses", get(get_courses))
        .route("/add-course", get(get_add_course).post(post_add_course))
        .route("/delete-course/{id}", get(get_delete_course))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("not loading .env file: {e}");
    }

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");

    let options = SqlitePoolOptions::new().max_connections(5);
    let config = RuntimeConfiguration::new().expect("unable to create config");
    let state = AcademyState::new(options, config)
        .await
        .expect("unable to create state");

    if state.config().seed_sample_data() {
        let mut tx = state
            .get_transaction()
            .await
            .expect("unable to start seeding transaction");
        let seeded = seed_sample_data(&mut tx)
            .await
            .expect("unable to seed sample data");
        tx.commit()
            .await
            .context(CommitTransactionSnafu)
            .expect("unable to commit sample data");
        info!(seeded, "Checked sample data");
    }

    {
        let mut conn = state
            .get_connection()
            .await
            .expect("unable to get db connection");
        let courses = Course::count(&mut conn).await.expect("unable to count courses");
        let teachers = Teacher::count(&mut conn).await.expect("unable to count teachers");
        let students = Student::count(&mut conn).await.expect("unable to count students");
        info!(courses, teachers, students, "Database ready");
    }

    let app = router(state.clone());

    let server_ip = state.config().server_ip().to_string();
    let listener = TcpListener::bind(&server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("unable to serve app");
}
