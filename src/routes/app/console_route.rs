use actix_web::{get, post, web, HttpResponse};
use askama::Template;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::{
    domain::{
        language::Language,
        notification::{Notification, Notifications},
        result_set::ResultSet,
        scrape_request::{ScrapeRequest, DEFAULT_REGION},
    },
    services::{load_data_cached, ResultCache, ScraperError, ScraperInvoker},
};

struct LanguageOption {
    code: &'static str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "console.html")]
struct ConsoleTemplate {
    region: String,
    languages: Vec<LanguageOption>,
    scrape_running: bool,
    notifications: Vec<Notification>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ConsoleTemplate {
    fn new(
        region: String,
        language: Language,
        scrape_running: bool,
        notifications: Notifications,
        result: &ResultSet,
    ) -> Self {
        ConsoleTemplate {
            region,
            languages: Language::ALL
                .iter()
                .map(|l| LanguageOption {
                    code: l.code(),
                    selected: *l == language,
                })
                .collect(),
            scrape_running,
            notifications: notifications.into_vec(),
            columns: result.columns.clone(),
            rows: result
                .rows
                .iter()
                .map(|r| r.display_cells().map(str::to_string).collect())
                .collect(),
        }
    }
}

/// Loads the table (or the cached copy) and renders the whole page.
async fn render_console(
    region: String,
    language: Language,
    mut notifications: Notifications,
    invoker: &ScraperInvoker,
    cache: &ResultCache,
    db: &PgConnectOptions,
) -> HttpResponse {
    let result = load_data_cached(cache, db, &mut notifications).await;
    if result.is_empty() {
        notifications.warning("No data found in database.");
    }

    let page = ConsoleTemplate::new(
        region,
        language,
        invoker.is_running(),
        notifications,
        &result,
    );

    match page.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => {
            log::error!("Error rendering console page: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/")]
async fn console(
    invoker: web::Data<ScraperInvoker>,
    cache: web::Data<ResultCache>,
    db: web::Data<PgConnectOptions>,
) -> HttpResponse {
    render_console(
        DEFAULT_REGION.to_string(),
        Language::default(),
        Notifications::new(),
        &invoker,
        &cache,
        &db,
    )
    .await
}

#[derive(Deserialize)]
struct ScrapeForm {
    region: String,
    language: Language,
}

#[post("/scrape")]
async fn scrape(
    invoker: web::Data<ScraperInvoker>,
    cache: web::Data<ResultCache>,
    db: web::Data<PgConnectOptions>,
    form: web::Form<ScrapeForm>,
) -> HttpResponse {
    let ScrapeForm { region, language } = form.into_inner();
    let mut notifications = Notifications::new();

    match ScrapeRequest::new(region.clone(), language) {
        Err(message) => notifications.warning(message),
        Ok(_) if invoker.is_running() => {
            notifications.warning("A scraper run is already in progress.")
        }
        Ok(request) => {
            notifications.info(format!("Scraping hotels in {}... please wait", request.region));

            match invoker.run(&request).await {
                Ok(outcome) => {
                    outcome.notify(&mut notifications);
                    cache.invalidate();
                    tokio::time::sleep(invoker.settings().settle_delay()).await;
                }
                Err(ScraperError::AlreadyRunning) => {
                    notifications.warning("A scraper run is already in progress.")
                }
                Err(e) => {
                    log::error!("Scraper run for {:?} failed: {:?}", request.region, e);
                    notifications.error(format!("Scraper could not be run: {}", e));
                }
            }
        }
    }

    render_console(region, language, notifications, &invoker, &cache, &db).await
}

#[post("/scrape/cancel")]
async fn cancel_scrape(
    invoker: web::Data<ScraperInvoker>,
    cache: web::Data<ResultCache>,
    db: web::Data<PgConnectOptions>,
) -> HttpResponse {
    let mut notifications = Notifications::new();
    if invoker.cancel() {
        notifications.info("Cancelling the running scraper.");
    } else {
        notifications.warning("No scraper run is in progress.");
    }

    render_console(
        DEFAULT_REGION.to_string(),
        Language::default(),
        notifications,
        &invoker,
        &cache,
        &db,
    )
    .await
}

#[post("/cache/invalidate")]
async fn invalidate_cache(
    invoker: web::Data<ScraperInvoker>,
    cache: web::Data<ResultCache>,
    db: web::Data<PgConnectOptions>,
) -> HttpResponse {
    cache.invalidate();
    let mut notifications = Notifications::new();
    notifications.info("Reloaded data from the database.");

    render_console(
        DEFAULT_REGION.to_string(),
        Language::default(),
        notifications,
        &invoker,
        &cache,
        &db,
    )
    .await
}
