/// One row of `hotels`, cells aligned with [`ResultSet::columns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelRecord {
    pub cells: Vec<Option<String>>,
}

impl HotelRecord {
    pub fn display_cells(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|c| c.as_deref().unwrap_or(""))
    }
}

/// Rows of `hotels` ordered by `name`, as returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<HotelRecord>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Full table as UTF-8 CSV: header row of column names, no index column,
    /// NULL written as an empty field.
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(vec![]);

        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
        }
        for row in self.rows.iter() {
            writer.write_record(row.display_cells())?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;

        // Only &str fields went in.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{HotelRecord, ResultSet};

    fn sample() -> ResultSet {
        ResultSet {
            columns: vec!["name".into(), "address".into(), "rating".into()],
            rows: vec![
                HotelRecord {
                    cells: vec![Some("Adler".into()), Some("Hauptstr. 1, Leipzig".into()), Some("4.5".into())],
                },
                HotelRecord {
                    cells: vec![Some("Bären \"Am See\"".into()), None, Some("3.9".into())],
                },
                HotelRecord {
                    cells: vec![Some("Zur Linde".into()), Some("Line\nbreak".into()), None],
                },
            ],
        }
    }

    #[test]
    fn csv_round_trips_columns_and_row_count() {
        let result_set = sample();
        let csv_text = result_set.to_csv().unwrap();

        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(|h| h.to_string())
            .collect();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(headers, result_set.columns);
        assert_eq!(records.len(), result_set.len());
        assert_eq!(&records[1][0], "Bären \"Am See\"");
        assert_eq!(&records[1][1], "");
        assert_eq!(&records[2][1], "Line\nbreak");
    }

    #[test]
    fn csv_has_no_index_column() {
        let csv_text = sample().to_csv().unwrap();
        assert!(csv_text.starts_with("name,address,rating\n"));
    }

    #[test]
    fn empty_result_set_exports_empty_text() {
        assert_eq!(ResultSet::empty().to_csv().unwrap(), "");
    }
}
