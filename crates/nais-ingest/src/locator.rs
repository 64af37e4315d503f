//! Source locator for Marine Cadastre monthly archives
//!
//! The portal changed its archive layout between releases: 2013 data ships as
//! a zipped geodatabase (`.gdb.zip`), 2014 as a plain `.zip`. The rule is a
//! pure function of (zone, year, month); any other year is an error rather
//! than a guess, since the upstream layout for those years is not known.

use nais_common::error::{NaisError, Result};

const HANDLER_BASE_URL: &str = "https://coast.noaa.gov/htdata/CMSP/AISDataHandler";

/// Return the Marine Cadastre URL for the given zone, year, and month.
pub fn source_url(zone: &str, year: &str, month: &str) -> Result<String> {
    match year {
        "2014" => Ok(format!(
            "{HANDLER_BASE_URL}/{year}/{month}/Zone{zone}_{year}_{month}.zip"
        )),
        "2013" => Ok(format!(
            "{HANDLER_BASE_URL}/{year}/{month}/Zone{zone}_{year}_{month}.gdb.zip"
        )),
        other => Err(NaisError::UnsupportedYear(other.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_source_url_2014() {
        assert_eq!(
            source_url("10", "2014", "01").unwrap(),
            "https://coast.noaa.gov/htdata/CMSP/AISDataHandler/2014/01/Zone10_2014_01.zip"
        );
    }

    #[test]
    fn test_source_url_2013_uses_gdb_archive() {
        assert_eq!(
            source_url("10", "2013", "12").unwrap(),
            "https://coast.noaa.gov/htdata/CMSP/AISDataHandler/2013/12/Zone10_2013_12.gdb.zip"
        );
    }

    #[test]
    fn test_source_url_other_years_are_undefined() {
        let err = source_url("10", "2015", "01").unwrap_err();
        match err {
            NaisError::UnsupportedYear(year) => assert_eq!(year, "2015"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
