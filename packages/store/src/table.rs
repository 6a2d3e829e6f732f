//! CSV table codec for the report collection.
//!
//! One header row followed by one row per report, columns in
//! [`COLUMNS`] order. The header written by the first deployment of the
//! application ([`LEGACY_COLUMNS`]) is accepted on read; writes always
//! use the canonical header and labels.

use std::collections::BTreeSet;
use std::str::FromStr as _;

use nuisance_map_nuisance_models::{Frequency, NuisanceReport, ReportParts};
use uuid::Uuid;

use crate::SchemaError;
use crate::codec;

/// Canonical column names, in storage order.
pub const COLUMNS: [&str; 8] = [
    "id",
    "submitterName",
    "latitude",
    "longitude",
    "address",
    "nuisanceTypes",
    "frequency",
    "comment",
];

/// Column names used by the first deployment, same order as [`COLUMNS`].
pub const LEGACY_COLUMNS: [&str; 8] = [
    "id",
    "nom",
    "lat",
    "lon",
    "adresse",
    "nuisances",
    "frequence",
    "commentaire",
];

/// Serializes the collection with the canonical header.
///
/// # Errors
///
/// Returns [`SchemaError::Encode`] if the CSV writer fails.
pub fn encode_reports(reports: &[NuisanceReport]) -> Result<Vec<u8>, SchemaError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS).map_err(encode_error)?;

    for report in reports {
        writer
            .write_record([
                report.id().to_string(),
                report.submitter_name().to_string(),
                report.latitude().to_string(),
                report.longitude().to_string(),
                report.address().to_string(),
                codec::encode_types(report.nuisance_types()),
                report.frequency().to_string(),
                report.comment().unwrap_or_default().to_string(),
            ])
            .map_err(encode_error)?;
    }

    writer.into_inner().map_err(|e| SchemaError::Encode {
        message: e.to_string(),
    })
}

/// Parses a stored collection.
///
/// An empty body is an empty collection. Rows are returned in stored order.
///
/// # Errors
///
/// Returns [`SchemaError`] on an unexpected header, a malformed row, an
/// unparseable field, a broken report invariant or a duplicated id.
pub fn decode_reports(body: &[u8]) -> Result<Vec<NuisanceReport>, SchemaError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body);

    let headers = reader.headers()?;
    let found: Vec<&str> = headers.iter().collect();
    if found != COLUMNS && found != LEGACY_COLUMNS {
        return Err(SchemaError::Header {
            found: found.into_iter().map(String::from).collect(),
        });
    }

    let mut reports = Vec::new();
    let mut seen = BTreeSet::new();

    for (i, record) in reader.records().enumerate() {
        let row = i + 1;
        let record = record?;
        if record.len() != COLUMNS.len() {
            return Err(SchemaError::FieldCount {
                row,
                expected: COLUMNS.len(),
                found: record.len(),
            });
        }

        let report = decode_row(row, &record)?;
        if !seen.insert(report.id()) {
            return Err(SchemaError::DuplicateId { id: report.id() });
        }
        reports.push(report);
    }

    Ok(reports)
}

fn decode_row(row: usize, record: &csv::StringRecord) -> Result<NuisanceReport, SchemaError> {
    let field = |index: usize| record.get(index).unwrap_or_default();

    let id = Uuid::parse_str(field(0)).map_err(|e| invalid(row, COLUMNS[0], field(0), &e))?;
    let latitude = parse_coordinate(row, COLUMNS[2], field(2))?;
    let longitude = parse_coordinate(row, COLUMNS[3], field(3))?;
    let nuisance_types =
        codec::decode_types(field(5)).map_err(|e| invalid(row, COLUMNS[5], field(5), &e))?;
    let frequency =
        Frequency::from_str(field(6)).map_err(|e| invalid(row, COLUMNS[6], field(6), &e))?;

    let comment = field(7);

    NuisanceReport::from_parts(ReportParts {
        id,
        submitter_name: field(1).to_string(),
        latitude,
        longitude,
        address: field(4).to_string(),
        nuisance_types,
        frequency,
        comment: (!comment.is_empty()).then(|| comment.to_string()),
    })
    .map_err(|source| SchemaError::InvalidReport { row, source })
}

fn parse_coordinate(row: usize, column: &'static str, value: &str) -> Result<f64, SchemaError> {
    value
        .parse::<f64>()
        .map_err(|e| invalid(row, column, value, &e))
}

fn invalid(
    row: usize,
    column: &'static str,
    value: &str,
    error: &dyn std::fmt::Display,
) -> SchemaError {
    SchemaError::InvalidField {
        row,
        column,
        value: value.to_string(),
        message: error.to_string(),
    }
}

fn encode_error(e: csv::Error) -> SchemaError {
    SchemaError::Encode {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use nuisance_map_nuisance_models::{NuisanceType, ReportSubmission};

    use super::*;

    fn report(types: Vec<NuisanceType>, comment: Option<&str>) -> NuisanceReport {
        ReportSubmission {
            submitter_name: Some("Ana, \"la voisine\"".to_string()),
            latitude: Some(43.653_88),
            longitude: Some(6.801_98),
            address: Some("12 rue des Lilas\nGrasse".to_string()),
            nuisance_types: types,
            frequency: Frequency::Monthly,
            comment: comment.map(String::from),
        }
        .into_report()
        .unwrap()
    }

    #[test]
    fn empty_body_is_empty_collection() {
        assert!(decode_reports(b"").unwrap().is_empty());
        assert!(decode_reports(b"\n").unwrap().is_empty());
    }

    #[test]
    fn header_only_is_empty_collection() {
        let body = encode_reports(&[]).unwrap();
        assert_eq!(
            String::from_utf8(body.clone()).unwrap(),
            "id,submitterName,latitude,longitude,address,nuisanceTypes,frequency,comment\n"
        );
        assert!(decode_reports(&body).unwrap().is_empty());
    }

    #[test]
    fn quoting_and_floats_are_lossless() {
        let reports = vec![
            report(
                vec![NuisanceType::Light, NuisanceType::Noise],
                Some("loud, bright\nevery night"),
            ),
            report(vec![NuisanceType::Odor], None),
        ];
        let decoded = decode_reports(&encode_reports(&reports).unwrap()).unwrap();
        assert_eq!(decoded, reports);
    }

    #[test]
    fn legacy_table_loads_with_canonical_labels() {
        let body = "id,nom,lat,lon,adresse,nuisances,frequence,commentaire\n\
                    0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,anonyme,43.65388,6.80198,Localisation manuelle,Bruit;Effet sur la santé,Une fois par semaine,\n";
        let reports = decode_reports(body.as_bytes()).unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.submitter_name(), "anonyme");
        assert_eq!(
            report.nuisance_types().as_slice(),
            &[NuisanceType::Noise, NuisanceType::HealthEffect]
        );
        assert_eq!(report.frequency(), Frequency::Weekly);
        assert_eq!(report.comment(), None);

        let rewritten = String::from_utf8(encode_reports(&reports).unwrap()).unwrap();
        assert!(rewritten.starts_with("id,submitterName,"));
        assert!(rewritten.contains("Noise;Health effect,Weekly"));
    }

    #[test]
    fn unexpected_header_is_schema_error() {
        let err = decode_reports(b"id,name\n1,2\n").unwrap_err();
        assert!(matches!(err, SchemaError::Header { .. }));
    }

    #[test]
    fn unknown_type_is_schema_error_with_row() {
        let body = "id,submitterName,latitude,longitude,address,nuisanceTypes,frequency,comment\n\
                    0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,a,1,2,x,Noise,Daily,\n\
                    1c7f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,b,1,2,x,Noise;Smoke,Daily,\n";
        match decode_reports(body.as_bytes()).unwrap_err() {
            SchemaError::InvalidField { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "nuisanceTypes");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_types_field_is_schema_error() {
        let body = "id,submitterName,latitude,longitude,address,nuisanceTypes,frequency,comment\n\
                    0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,a,1,2,x,,Daily,\n";
        assert!(matches!(
            decode_reports(body.as_bytes()).unwrap_err(),
            SchemaError::InvalidField {
                column: "nuisanceTypes",
                ..
            }
        ));
    }

    #[test]
    fn short_row_is_schema_error() {
        let body = "id,submitterName,latitude,longitude,address,nuisanceTypes,frequency,comment\n\
                    0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,a,1,2\n";
        assert!(matches!(
            decode_reports(body.as_bytes()).unwrap_err(),
            SchemaError::FieldCount {
                row: 1,
                expected: 8,
                found: 4
            }
        ));
    }

    #[test]
    fn bad_frequency_and_coordinates_are_schema_errors() {
        let header = "id,submitterName,latitude,longitude,address,nuisanceTypes,frequency,comment\n";
        let bad_frequency = format!(
            "{header}0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,a,1,2,x,Noise,Hourly,\n"
        );
        assert!(matches!(
            decode_reports(bad_frequency.as_bytes()).unwrap_err(),
            SchemaError::InvalidField {
                column: "frequency",
                ..
            }
        ));

        let bad_latitude = format!(
            "{header}0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,a,north,2,x,Noise,Daily,\n"
        );
        assert!(matches!(
            decode_reports(bad_latitude.as_bytes()).unwrap_err(),
            SchemaError::InvalidField {
                column: "latitude",
                ..
            }
        ));

        let out_of_range = format!(
            "{header}0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,a,120,2,x,Noise,Daily,\n"
        );
        assert!(matches!(
            decode_reports(out_of_range.as_bytes()).unwrap_err(),
            SchemaError::InvalidReport { row: 1, .. }
        ));
    }

    #[test]
    fn duplicate_ids_are_schema_error() {
        let body = "id,submitterName,latitude,longitude,address,nuisanceTypes,frequency,comment\n\
                    0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,a,1,2,x,Noise,Daily,\n\
                    0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,b,3,4,y,Odor,Daily,\n";
        assert!(matches!(
            decode_reports(body.as_bytes()).unwrap_err(),
            SchemaError::DuplicateId { .. }
        ));
    }
}
