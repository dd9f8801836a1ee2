mod catalog;
mod config;
mod database;
mod error;
mod model;
mod queries;
mod relations;
mod routes;
mod validation;

use actix_web::{middleware::Logger, App, HttpServer};
use config::Config;
use log::info;

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "filmorate=debug,actix_web=info");
    }
    env_logger::init();

    let config = Config::from_env();
    let db = config.open_db()?;
    match &config.database {
        Some(path) => info!("opened database at {}", path.display()),
        None => info!("using a temporary database"),
    }
    info!("listening on {}", config.bind);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .data(db.clone())
            .configure(routes::configure)
    })
    .bind(&config.bind)?
    .run()
    .await
}
