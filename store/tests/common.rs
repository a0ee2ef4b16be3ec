use sqlx::Pool;
use sqlx::postgres::PgPoolOptions;
use store::PgStore;
use testcontainers_modules::{
    postgres::Postgres,
    testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner},
};

/// Set up a Postgres Docker container and a migrated [`PgStore`] on top of
/// it, for testing purposes.
///
/// # Returns
/// - A [`ContainerAsync<Postgres>`], which is returned to prevent the
///   container from being dropped.
/// - A [`PgStore`] connected to a freshly migrated database.
pub async fn setup() -> (ContainerAsync<Postgres>, PgStore) {
    let container = Postgres::default()
        .with_tag("latest")
        .start()
        .await
        .unwrap();

    let db_url = construct_db_url(&container).await;

    let pool: Pool<sqlx::Postgres> = PgPoolOptions::new().connect(&db_url).await.unwrap();

    let store = PgStore::from_pool(pool);
    store.migrate().await.unwrap();

    (container, store)
}

async fn construct_db_url(container: &ContainerAsync<Postgres>) -> String {
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let host = "127.0.0.1";
    let user = "postgres";
    let password = "postgres";
    let database = "postgres";

    format!("postgres://{user}:{password}@{host}:{port}/{database}")
}
