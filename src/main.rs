use std::net::TcpListener;

use anyhow::Context;
use env_logger::Env;
use hotel_console::{
    configuration::get_configuration,
    services::{ResultCache, ScraperInvoker},
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;

    log::info!(
        "Serving hotel console on http://{} (scraper: {} {})",
        address,
        configuration.scraper.interpreter,
        configuration.scraper.script_path.display()
    );

    let scraper_invoker = ScraperInvoker::new(configuration.scraper);
    let result_cache = ResultCache::new(configuration.viewer.cache_ttl());

    run(
        listener,
        configuration.database.with_db(),
        scraper_invoker,
        result_cache,
    )?
    .await?;

    Ok(())
}
