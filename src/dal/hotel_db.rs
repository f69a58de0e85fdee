use sqlx::{postgres::PgConnectOptions, Column, Connection, PgConnection, Row};

use crate::domain::result_set::{HotelRecord, ResultSet};

pub const HOTELS_QUERY: &str = "SELECT * FROM hotels ORDER BY name";

#[derive(Debug, thiserror::Error)]
pub enum HotelDbError {
    #[error("could not connect to the database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

/// Opens a connection, reads the whole `hotels` table and closes it again.
///
/// The query goes over the simple-query protocol, so every cell arrives as
/// text whatever its column type; the table schema is not known here.
pub async fn get_hotel_table(options: &PgConnectOptions) -> Result<ResultSet, HotelDbError> {
    let mut connection = PgConnection::connect_with(options)
        .await
        .map_err(HotelDbError::Connect)?;

    let rows = sqlx::raw_sql(HOTELS_QUERY).fetch_all(&mut connection).await;

    if let Err(e) = connection.close().await {
        log::warn!("Error closing database connection: {:?}", e);
    }

    let rows = rows.map_err(HotelDbError::Query)?;

    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(|row| {
            let cells = (0..row.len())
                .map(|i| row.try_get_unchecked::<Option<String>, _>(i))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(HotelRecord { cells })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(HotelDbError::Query)?;

    Ok(ResultSet { columns, rows })
}
