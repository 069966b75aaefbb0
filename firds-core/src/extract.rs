//! Extractor: turns instrument records into CSV rows.
//!
//! Each `FinInstrm` record wraps a report kind (`NewRcrd`, `ModfdRcrd`,
//! `TermntdRcrd`, ...) whose first child is the general attributes block
//! `FinInstrmGnlAttrbts`. Five columns come from that block; the issuer
//! (`Issr`) sits beside it and is searched for from the record root.

use crate::error::{EtlError, Result};
use crate::xml::Element;
use std::path::Path;
use tracing::{error, info, instrument};

/// Fixed CSV header, in column order.
pub const CSV_HEADER: [&str; 6] = [
    "FinInstrmGnlAttrbts.Id",
    "FinInstrmGnlAttrbts.FullNm",
    "FinInstrmGnlAttrbts.ClssfctnTp",
    "FinInstrmGnlAttrbts.CmmdtyDerivInd",
    "FinInstrmGnlAttrbts.NtnlCcy",
    "Issr",
];

const ATTRIBUTES_BLOCK: &str = "FinInstrmGnlAttrbts";
const ISSUER: &str = "Issr";

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentRow {
    pub id: String,
    pub full_name: String,
    pub classification_type: String,
    pub commodity_derivative_indicator: String,
    pub notional_currency: String,
    pub issuer: String,
}

impl InstrumentRow {
    /// Read the six fields out of one record.
    ///
    /// `position` is only used to identify the record in errors.
    pub fn from_record(record: &Element, position: usize) -> Result<Self> {
        let missing = |field: &'static str| EtlError::MissingField {
            record: position,
            field,
        };

        let block = record
            .first_child_element()
            .and_then(Element::first_child_element)
            .ok_or_else(|| missing(ATTRIBUTES_BLOCK))?;

        let field = |scope: &Element, tag: &'static str| -> Result<String> {
            scope
                .find_first(tag)
                .map(Element::text)
                .filter(|text| !text.is_empty())
                .ok_or_else(|| missing(tag))
        };

        Ok(Self {
            id: field(block, "Id")?,
            full_name: field(block, "FullNm")?,
            classification_type: field(block, "ClssfctnTp")?,
            commodity_derivative_indicator: field(block, "CmmdtyDerivInd")?,
            notional_currency: field(block, "NtnlCcy")?,
            issuer: field(record, ISSUER)?,
        })
    }

    fn as_record(&self) -> [&str; 6] {
        [
            self.id.as_str(),
            self.full_name.as_str(),
            self.classification_type.as_str(),
            self.commodity_derivative_indicator.as_str(),
            self.notional_currency.as_str(),
            self.issuer.as_str(),
        ]
    }
}

/// Extract one row per record, failing on the first incomplete record.
pub fn extract_rows(records: &[Element]) -> Result<Vec<InstrumentRow>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| InstrumentRow::from_record(record, i))
        .collect()
}

/// Write header plus rows to `path`, overwriting any existing file.
///
/// The immediate parent directory is created if missing; deeper missing
/// levels are an error.
pub fn write_csv(rows: &[InstrumentRow], path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir(dir)?;
            info!("created directory {}", dir.display());
        }
    }

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(CSV_HEADER)?;
    for row in rows {
        wtr.write_record(row.as_record())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Extract every record and write the CSV.
///
/// All rows are extracted before the file is opened, so an incomplete record
/// leaves any previous file at `path` untouched.
#[instrument(name = "extract_to_csv", skip(records), fields(records = records.len()))]
pub fn extract_to_csv(records: &[Element], path: &Path) -> Result<()> {
    let rows = extract_rows(records).map_err(|e| {
        error!("failed to extract rows: {e}");
        e
    })?;
    info!("successfully parsed data, writing to CSV");
    write_csv(&rows, path).map_err(|e| {
        error!("failed to write {}: {e}", path.display());
        e
    })?;
    info!("successfully created CSV at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn record(xml: &str) -> Element {
        parse_document(xml).unwrap()
    }

    const COMPLETE: &str = "<FinInstrm><ModfdRcrd><FinInstrmGnlAttrbts>\
        <Id>DE000A1R07V3</Id><FullNm>KFW 1 5/8 01/15/21</FullNm><ShrtNm>x</ShrtNm>\
        <ClssfctnTp>DBFTFB</ClssfctnTp><NtnlCcy>EUR</NtnlCcy><CmmdtyDerivInd>false</CmmdtyDerivInd>\
        </FinInstrmGnlAttrbts><Issr>549300GDPG70E3MBBU98</Issr></ModfdRcrd></FinInstrm>";

    #[test]
    fn reads_all_six_fields() {
        let row = InstrumentRow::from_record(&record(COMPLETE), 0).unwrap();
        assert_eq!(row.id, "DE000A1R07V3");
        assert_eq!(row.full_name, "KFW 1 5/8 01/15/21");
        assert_eq!(row.classification_type, "DBFTFB");
        assert_eq!(row.commodity_derivative_indicator, "false");
        assert_eq!(row.notional_currency, "EUR");
        assert_eq!(row.issuer, "549300GDPG70E3MBBU98");
    }

    #[test]
    fn missing_block_field_names_record_and_tag() {
        let xml = COMPLETE.replace("<NtnlCcy>EUR</NtnlCcy>", "");
        let err = extract_rows(&[record(COMPLETE), record(&xml)]).unwrap_err();
        assert!(
            matches!(err, EtlError::MissingField { record: 1, field: "NtnlCcy" }),
            "got {err:?}"
        );
    }

    #[test]
    fn missing_issuer_is_reported() {
        let xml = COMPLETE.replace("<Issr>549300GDPG70E3MBBU98</Issr>", "");
        let err = InstrumentRow::from_record(&record(&xml), 0).unwrap_err();
        assert!(matches!(err, EtlError::MissingField { field: "Issr", .. }));
    }

    #[test]
    fn empty_field_counts_as_missing() {
        let xml = COMPLETE.replace("<Id>DE000A1R07V3</Id>", "<Id/>");
        let err = InstrumentRow::from_record(&record(&xml), 0).unwrap_err();
        assert!(matches!(err, EtlError::MissingField { field: "Id", .. }));
    }

    #[test]
    fn shallow_record_has_no_block() {
        let err = InstrumentRow::from_record(&record("<FinInstrm><Issr>x</Issr></FinInstrm>"), 4)
            .unwrap_err();
        assert!(matches!(
            err,
            EtlError::MissingField { record: 4, field: "FinInstrmGnlAttrbts" }
        ));
    }

    #[test]
    fn fields_outside_the_block_are_ignored() {
        // An Id elsewhere in the record must not satisfy the block lookup.
        let xml = "<FinInstrm><NewRcrd><FinInstrmGnlAttrbts><FullNm>n</FullNm>\
            <ClssfctnTp>c</ClssfctnTp><CmmdtyDerivInd>true</CmmdtyDerivInd><NtnlCcy>USD</NtnlCcy>\
            </FinInstrmGnlAttrbts><Id>outside</Id><Issr>i</Issr></NewRcrd></FinInstrm>";
        let err = InstrumentRow::from_record(&record(xml), 0).unwrap_err();
        assert!(matches!(err, EtlError::MissingField { field: "Id", .. }));
    }
}
