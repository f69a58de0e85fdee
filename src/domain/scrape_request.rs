use serde::Serialize;

use super::language::Language;

pub const DEFAULT_REGION: &str = "Leipzig";

/// Parameters for one scraper run. The region is used verbatim, quotes included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeRequest {
    pub region: String,
    pub language: Language,
}

impl ScrapeRequest {
    pub fn new(region: String, language: Language) -> Result<Self, String> {
        if region.is_empty() {
            return Err("Region must not be empty".to_string());
        }

        Ok(ScrapeRequest { region, language })
    }
}

#[cfg(test)]
mod tests {
    use super::ScrapeRequest;
    use crate::domain::language::Language;

    #[test]
    fn empty_region_is_rejected() {
        assert!(ScrapeRequest::new("".to_string(), Language::En).is_err());
    }

    #[test]
    fn region_is_kept_verbatim() {
        let request = ScrapeRequest::new(" O'Hare ".to_string(), Language::Fr).unwrap();
        assert_eq!(request.region, " O'Hare ");
    }
}
