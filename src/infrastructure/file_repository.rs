// File-backed dataset repository (CSV catalogs and trajectories, JSON fiber recordings)
use crate::application::dataset_repository::{DatasetRepository, WellSurvey};
use crate::domain::catalog::{BRUNE_MAGNITUDE, EventCatalog, MsEvent, STAGE};
use crate::domain::error::DataError;
use crate::domain::time_series::{TimeAxisKind, TimeSeries, parse_datetime};
use crate::domain::trajectory::TrajectoryPoint;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILE_NAME: &str = "File Name";
const EASTING: &str = "Easting";
const NORTHING: &str = "Northing";
const DEPTH_TVDSS: &str = "Depth TVDSS";
const ORIGIN_DATE: &str = "Origin Time - Date (UTC)";
const ORIGIN_TIME: &str = "Origin Time - Time (UTC)";
const ORIGIN_MS: &str = "Origin Time - Millisecond (UTC)";
const WELL: &str = "Well";
const TVD: &str = "True Vertical Depth";

const CATALOG_COLUMNS: [&str; 9] = [
    FILE_NAME,
    EASTING,
    NORTHING,
    DEPTH_TVDSS,
    ORIGIN_DATE,
    ORIGIN_TIME,
    ORIGIN_MS,
    BRUNE_MAGNITUDE,
    STAGE,
];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("{}: missing required columns: {}", .path.display(), .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
    #[error("{}, record {record}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        record: usize,
        message: String,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Data(#[from] DataError),
}

pub struct FileRepository {
    catalog: Option<PathBuf>,
    wells: Option<PathBuf>,
    fiber: Option<PathBuf>,
}

impl FileRepository {
    pub fn new(catalog: Option<PathBuf>, wells: Option<PathBuf>, fiber: Option<PathBuf>) -> Self {
        Self { catalog, wells, fiber }
    }
}

#[async_trait]
impl DatasetRepository for FileRepository {
    async fn load_catalog(&self) -> anyhow::Result<Option<EventCatalog>> {
        let Some(path) = &self.catalog else {
            return Ok(None);
        };
        let bytes = read(path).await?;
        let catalog = parse_catalog(&bytes, path)?;
        tracing::info!("Loaded {} microseismic events from {}", catalog.len(), path.display());
        Ok(Some(catalog))
    }

    async fn load_wells(&self) -> anyhow::Result<Vec<WellSurvey>> {
        let Some(path) = &self.wells else {
            return Ok(Vec::new());
        };
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| IngestError::FileNotFound(path.clone()))?;

        let surveys = if metadata.is_dir() {
            let mut files = Vec::new();
            let mut entries = tokio::fs::read_dir(path).await.map_err(IngestError::from)?;
            while let Some(entry) = entries.next_entry().await.map_err(IngestError::from)? {
                let file = entry.path();
                if file.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                    files.push(file);
                }
            }
            files.sort();

            let mut surveys = Vec::with_capacity(files.len());
            for file in files {
                let name = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let bytes = read(&file).await?;
                surveys.push(parse_well_file(&bytes, &file, &name)?);
            }
            surveys
        } else {
            let bytes = read(path).await?;
            parse_wells_table(&bytes, path)?
        };

        tracing::info!("Loaded {} well trajectories from {}", surveys.len(), path.display());
        Ok(surveys)
    }

    async fn load_fiber(&self) -> anyhow::Result<Option<TimeSeries>> {
        let Some(path) = &self.fiber else {
            return Ok(None);
        };
        let bytes = read(path).await?;
        let series = parse_fiber(&bytes, path)?;
        tracing::info!(
            "Loaded fiber recording from {}: {} channels x {} samples",
            path.display(),
            series.channel_count(),
            series.sample_count()
        );
        Ok(Some(series))
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, IngestError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(IngestError::FileNotFound(path.to_path_buf())),
        Err(e) => Err(e.into()),
    }
}

/// Header positions of the named columns; every name must be present.
fn column_indices<const N: usize>(
    headers: &csv::StringRecord,
    names: [&str; N],
    path: &Path,
) -> Result<[usize; N], IngestError> {
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let missing: Vec<String> = names
        .into_iter()
        .filter(|n| position(*n).is_none())
        .map(|n| n.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }
    Ok(names.map(|n| position(n).unwrap_or_default()))
}

/// Non-numeric text becomes NaN.
fn coerce_f64(field: Option<&str>) -> f64 {
    field
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn parse_origin(date: &str, time: &str, millis: &str) -> Result<NaiveDateTime, String> {
    let date = NaiveDate::parse_from_str(date.trim(), "%m/%d/%Y").map_err(|e| format!("origin date '{}': {}", date, e))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S%.f"))
        .map_err(|e| format!("origin time '{}': {}", time, e))?;
    let millis = millis
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("origin millisecond '{}': {}", millis, e))?;
    let offset = Some(millis)
        .filter(|ms| ms.is_finite())
        .and_then(|ms| TimeDelta::try_milliseconds(ms.round() as i64))
        .ok_or_else(|| format!("origin millisecond '{}' out of range", millis))?;
    date.and_time(time)
        .checked_add_signed(offset)
        .ok_or_else(|| format!("origin millisecond '{}' out of range", millis))
}

/// Microseismic catalog CSV. The record after the header holds units and is skipped.
pub fn parse_catalog(bytes: &[u8], path: &Path) -> Result<EventCatalog, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader.headers()?.clone();
    let [name, easting, northing, depth, date, time, millis, magnitude, stage] =
        column_indices(&headers, CATALOG_COLUMNS, path)?;

    let records: Vec<csv::StringRecord> = reader.records().skip(1).collect::<Result<_, _>>()?;

    // extra columns count as attributes only when every filled cell is numeric
    let extras: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !CATALOG_COLUMNS.contains(&h.trim()))
        .filter(|(i, _)| {
            let mut filled = records
                .iter()
                .filter_map(|r| r.get(*i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .peekable();
            filled.peek().is_some() && filled.all(|v| v.parse::<f64>().is_ok())
        })
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();

    let mut events = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let record_number = i + 2;
        let parse_error = |message: String| IngestError::Parse {
            path: path.to_path_buf(),
            record: record_number,
            message,
        };
        let field = |index: usize| record.get(index).unwrap_or("");

        let origin = parse_origin(field(date), field(time), field(millis)).map_err(parse_error)?;
        let stage_value = field(stage)
            .trim()
            .parse::<f64>()
            .map_err(|e| parse_error(format!("stage '{}': {}", field(stage), e)))?;
        if !stage_value.is_finite() || stage_value.fract() != 0.0 {
            return Err(parse_error(format!("stage '{}' is not an integer", field(stage).trim())));
        }

        events.push(MsEvent {
            file_name: field(name).trim().to_string(),
            easting: coerce_f64(record.get(easting)),
            northing: coerce_f64(record.get(northing)),
            depth_tvdss: coerce_f64(record.get(depth)),
            origin,
            brune_magnitude: coerce_f64(record.get(magnitude)),
            stage: stage_value as i64,
            extra: extras
                .iter()
                .map(|(index, header)| (header.clone(), coerce_f64(record.get(*index))))
                .collect(),
        });
    }

    Ok(EventCatalog::new(events))
}

fn survey_point(record: &csv::StringRecord, [easting, northing, tvd]: [usize; 3]) -> Option<TrajectoryPoint> {
    let point = TrajectoryPoint::new(
        coerce_f64(record.get(easting)),
        coerce_f64(record.get(northing)),
        coerce_f64(record.get(tvd)),
    );
    (point.easting.is_finite() && point.northing.is_finite() && point.tvdss.is_finite()).then_some(point)
}

/// One well per file; rows with non-numeric coordinates are dropped.
pub fn parse_well_file(bytes: &[u8], path: &Path, name: &str) -> Result<WellSurvey, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let columns = column_indices(reader.headers()?, [EASTING, NORTHING, TVD], path)?;

    let mut offsets = Vec::new();
    for record in reader.records() {
        if let Some(point) = survey_point(&record?, columns) {
            offsets.push(point);
        }
    }
    Ok(WellSurvey {
        name: name.to_string(),
        offsets,
    })
}

/// Several wells in one table, split on the `Well` column in first-appearance order.
pub fn parse_wells_table(bytes: &[u8], path: &Path) -> Result<Vec<WellSurvey>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let [well, easting, northing, tvd] = column_indices(reader.headers()?, [WELL, EASTING, NORTHING, TVD], path)?;

    let mut wells: IndexMap<String, Vec<TrajectoryPoint>> = IndexMap::new();
    for record in reader.records() {
        let record = record?;
        let name = record.get(well).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        let offsets = wells.entry(name.to_string()).or_default();
        if let Some(point) = survey_point(&record, [easting, northing, tvd]) {
            offsets.push(point);
        }
    }

    Ok(wells
        .into_iter()
        .map(|(name, offsets)| WellSurvey { name, offsets })
        .collect())
}

#[derive(Deserialize)]
struct FiberFile {
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    datetime: Option<Vec<String>>,
    taxis: Vec<f64>,
    daxis: Vec<f64>,
    /// One row per channel; `null` cells read as NaN
    data: Vec<Vec<Option<f64>>>,
}

/// Fiber recording JSON; per-sample datetimes win over a start time.
pub fn parse_fiber(bytes: &[u8], path: &Path) -> Result<TimeSeries, IngestError> {
    let file: FiberFile = serde_json::from_slice(bytes)?;
    let parse_error = |message: String| IngestError::Parse {
        path: path.to_path_buf(),
        record: 0,
        message,
    };

    let reference = if let Some(datetimes) = &file.datetime {
        let parsed = datetimes
            .iter()
            .map(|d| parse_datetime(d))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| parse_error(e.to_string()))?;
        Some(TimeAxisKind::ExplicitDatetimes(parsed))
    } else if let Some(start) = &file.start_time {
        let start = parse_datetime(start).map_err(|e| parse_error(e.to_string()))?;
        Some(TimeAxisKind::StartPlusOffsets {
            start,
            offsets_s: file.taxis.clone(),
        })
    } else {
        tracing::warn!("{} has no start_time or datetime; time matching uses seconds only", path.display());
        None
    };

    let rows = file
        .data
        .into_iter()
        .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        .collect();
    Ok(TimeSeries::new(file.taxis, file.daxis, rows, reference)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = "\
File Name,Easting,Northing,Depth TVDSS,Origin Time - Date (UTC),Origin Time - Time (UTC),Origin Time - Millisecond (UTC),Brune Magnitude,Stage,Moment,Comment
,ft,ft,ft,,,,,,N.m,
ev2,1200.5,3400.25,-9000,05/01/2024,10:00:05,250,-1.25,3,1.5e9,late
ev1,1100,3300,-9100,05/01/2024,10:00:00,0,-0.5,2,2.0e9,early
ev3,bad,3500,-9200,05/01/2024,10:00:05,250,-2.0,3,,x
";

    fn path() -> PathBuf {
        PathBuf::from("events.csv")
    }

    #[test]
    fn test_catalog_skips_units_row_and_orders_by_origin() {
        let catalog = parse_catalog(CATALOG.as_bytes(), &path()).unwrap();
        assert_eq!(catalog.len(), 3);
        let first = &catalog.events()[0];
        assert_eq!(first.file_name, "ev1");
        assert_eq!(first.stage, 2);
        let second = &catalog.events()[1];
        assert_eq!(
            second.origin,
            parse_datetime("2024-05-01 10:00:05.250").unwrap()
        );
        assert_eq!(second.brune_magnitude, -1.25);
        // two events share an origin time
        assert_eq!(catalog.origin_times().len(), 2);
    }

    #[test]
    fn test_catalog_coerces_and_keeps_numeric_extras() {
        let catalog = parse_catalog(CATALOG.as_bytes(), &path()).unwrap();
        let bad = catalog.events().iter().find(|e| e.file_name == "ev3").unwrap();
        assert!(bad.easting.is_nan());
        assert!(bad.attribute("Moment").unwrap().is_nan());
        assert_eq!(
            catalog.attribute_names(),
            vec![STAGE.to_string(), BRUNE_MAGNITUDE.to_string(), "Moment".to_string()]
        );
        assert!(!catalog.has_attribute("Comment"));
    }

    #[test]
    fn test_catalog_reports_missing_columns() {
        let csv = "File Name,Easting,Northing\n,,\na,1,2\n";
        match parse_catalog(csv.as_bytes(), &path()) {
            Err(IngestError::MissingColumns { missing, .. }) => {
                assert_eq!(missing.len(), 6);
                assert!(missing.contains(&STAGE.to_string()));
            }
            other => panic!("expected missing columns, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_catalog_bad_date_names_the_record() {
        let csv = CATALOG.replace("05/01/2024,10:00:00", "2024-05-01,10:00:00");
        match parse_catalog(csv.as_bytes(), &path()) {
            Err(IngestError::Parse { record, .. }) => assert_eq!(record, 3),
            other => panic!("expected parse error, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_catalog_millisecond_overflow_is_a_parse_error() {
        for millis in ["1e18", "-inf"] {
            let csv = CATALOG.replace("10:00:00,0,", &format!("10:00:00,{},", millis));
            match parse_catalog(csv.as_bytes(), &path()) {
                Err(IngestError::Parse { record, message, .. }) => {
                    assert_eq!(record, 3);
                    assert!(message.contains("out of range"), "{}", message);
                }
                other => panic!("expected parse error, got {:?}", other.map(|c| c.len())),
            }
        }
    }

    #[test]
    fn test_catalog_rejects_fractional_stage() {
        let csv = CATALOG.replace("-0.5,2,", "-0.5,2.7,");
        match parse_catalog(csv.as_bytes(), &path()) {
            Err(IngestError::Parse { record, message, .. }) => {
                assert_eq!(record, 3);
                assert!(message.contains("stage '2.7'"), "{}", message);
            }
            other => panic!("expected parse error, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_wells_table_grouped_in_first_appearance_order() {
        let csv = "\
Well,Easting,Northing,True Vertical Depth
B,0,0,0
A,10,10,0
B,5,0,100
A,n/a,10,50
A,10,10,100
";
        let wells = parse_wells_table(csv.as_bytes(), Path::new("wells.csv")).unwrap();
        let names: Vec<&str> = wells.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(wells[1].offsets.len(), 2);
        assert_eq!(wells[0].offsets[1], TrajectoryPoint::new(5.0, 0.0, 100.0));
    }

    #[test]
    fn test_fiber_with_start_time() {
        let json = r#"{
            "start_time": "2024-05-01 10:00:00",
            "taxis": [0.0, 1.0],
            "daxis": [0.0, 10.0, 20.0],
            "data": [[1, 2], [3, null], [5, 6]]
        }"#;
        let series = parse_fiber(json.as_bytes(), Path::new("das.json")).unwrap();
        assert_eq!(series.channel_count(), 3);
        assert!(series.value(1, 1).is_nan());
        assert_eq!(
            series.time_reference().unwrap().datetime_at(1),
            parse_datetime("2024-05-01 10:00:01").ok()
        );
    }

    #[test]
    fn test_fiber_shape_mismatch_is_rejected() {
        let json = r#"{"taxis": [0.0, 1.0], "daxis": [0.0], "data": [[1, 2], [3, 4]]}"#;
        assert!(matches!(
            parse_fiber(json.as_bytes(), Path::new("das.json")),
            Err(IngestError::Data(_))
        ));
    }

    #[tokio::test]
    async fn test_repository_reads_well_directory() {
        let dir = tempfile::tempdir().unwrap();
        for (name, rows) in [("Well-2", "0,0,0\n0,0,500\n"), ("Well-1", "1,1,0\n1,1,250\n")] {
            let mut file = std::fs::File::create(dir.path().join(format!("{}.csv", name))).unwrap();
            write!(file, "Easting,Northing,True Vertical Depth\n{}", rows).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let repo = FileRepository::new(None, Some(dir.path().to_path_buf()), None);
        let wells = repo.load_wells().await.unwrap();
        let names: Vec<&str> = wells.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Well-1", "Well-2"]);
        assert_eq!(wells[1].offsets[1].tvdss, 500.0);
        assert!(repo.load_catalog().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repository_missing_file() {
        let repo = FileRepository::new(Some(PathBuf::from("/nonexistent/events.csv")), None, None);
        let err = repo.load_catalog().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<IngestError>(), Some(IngestError::FileNotFound(_))));
    }
}
