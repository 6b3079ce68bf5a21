use crate::error::AcademyResult;
use sqlx::SqliteConnection;

pub mod course;
pub mod person;
pub mod seed;
pub mod student;
pub mod teacher;

#[allow(async_fn_in_trait)]
pub trait DataType: Sized {
    type Id;
    type FormForAdding;

    async fn get_from_db_by_id(id: Self::Id, conn: &mut SqliteConnection) -> AcademyResult<Option<Self>>;
    async fn get_all(conn: &mut SqliteConnection) -> AcademyResult<Vec<Self>>;
    async fn insert_into_database(
        to_be_added: Self::FormForAdding,
        conn: &mut SqliteConnection,
    ) -> AcademyResult<Self::Id>;
    async fn remove_from_database(id: Self::Id, conn: &mut SqliteConnection) -> AcademyResult<()>;
}
