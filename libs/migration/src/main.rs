//! SeaORM migration CLI, e.g. `cargo run -p migration -- up` with `DATABASE_URL` set.

use migration::Migrator;

#[tokio::main]
async fn main() {
    sea_orm_migration::cli::run_cli(Migrator).await;
}
