use std::net::TcpListener;

use actix_files::Files;
use actix_web::{
    dev::Server,
    middleware::Logger,
    web::{self, Data},
    App, HttpServer,
};
use sqlx::postgres::PgConnectOptions;

use crate::{
    routes::{console_route, default_route, export_route},
    services::{ResultCache, ScraperInvoker},
};

/// Routes of the console, without shared state.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(default_route::health_check)
        .service(console_route::console)
        .service(console_route::scrape)
        .service(console_route::cancel_scrape)
        .service(console_route::invalidate_cache)
        .service(export_route::export_csv);
}

pub fn run(
    listener: TcpListener,
    db_options: PgConnectOptions,
    scraper_invoker: ScraperInvoker,
    result_cache: ResultCache,
) -> Result<Server, std::io::Error> {
    let db_options = Data::new(db_options);
    let scraper_invoker = Data::new(scraper_invoker);
    let result_cache = Data::new(result_cache);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(Files::new("/static", "./templates/static").prefer_utf8(true))
            .configure(configure)
            .app_data(db_options.clone())
            .app_data(scraper_invoker.clone())
            .app_data(result_cache.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
