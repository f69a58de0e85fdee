use actix_web::{get, http::header, web, HttpResponse};
use sqlx::postgres::PgConnectOptions;

use crate::{
    domain::notification::{Level, Notifications},
    services::{load_data_cached, ResultCache},
};

#[get("/hotels.csv")]
async fn export_csv(cache: web::Data<ResultCache>, db: web::Data<PgConnectOptions>) -> HttpResponse {
    let mut notifications = Notifications::new();
    let result = load_data_cached(&cache, &db, &mut notifications).await;

    // An empty download would look like an empty table.
    if notifications.count(Level::Error) > 0 {
        log::warn!("Refusing CSV export, the hotels table could not be loaded");
        return HttpResponse::ServiceUnavailable()
            .content_type("text/plain; charset=utf-8")
            .body("Database unavailable, no export produced.");
    }

    match result.to_csv() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                r#"attachment; filename="hotels.csv""#,
            ))
            .body(body),
        Err(e) => {
            log::error!("Error writing hotels CSV: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
