#[macro_use]
extern crate rocket;

use rocket::response::content::RawJson;

use kinpost::{boot, db, routes};

#[catch(404)]
fn not_found() -> RawJson<&'static str> {
    RawJson(r#"{"error":"not found"}"#)
}

#[catch(500)]
fn server_error() -> RawJson<&'static str> {
    RawJson(r#"{"error":"internal server error"}"#)
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let db_path = db::db_path();

    // Boot check: verify/create the database directory
    boot::run(&db_path);

    let pool = db::init_pool().expect("Failed to initialize database pool");
    db::run_migrations(&pool).expect("Failed to run database migrations");
    db::seed_defaults(&pool).expect("Failed to seed default settings");

    log::info!("Database ready at {}", db_path);

    rocket::build()
        .manage(pool)
        .mount("/api", routes::api::routes())
        .register("/", catchers![not_found, server_error])
}
