use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::domain::NeoError;

const BUNDLED: &str = include_str!("../data/near-earth-asteroids.json");

#[derive(Debug)]
enum FileType {
    JSON,
    CSV,
    PARQUET,
    ARROW,
}

/// One asteroid. Every field is kept as the raw string found in the source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(deserialize_with = "raw_field")]
    pub designation: Option<String>,
    #[serde(deserialize_with = "raw_field")]
    pub discovery_date: Option<String>,
    #[serde(deserialize_with = "raw_field")]
    pub h_mag: Option<String>,
    #[serde(deserialize_with = "raw_field")]
    pub moid_au: Option<String>,
    #[serde(deserialize_with = "raw_field")]
    pub q_au_1: Option<String>,
    #[serde(deserialize_with = "raw_field")]
    pub q_au_2: Option<String>,
    #[serde(deserialize_with = "raw_field")]
    pub period_yr: Option<String>,
    #[serde(deserialize_with = "raw_field")]
    pub i_deg: Option<String>,
    #[serde(deserialize_with = "raw_field")]
    pub pha: Option<String>,
    #[serde(deserialize_with = "raw_field")]
    pub orbit_class: Option<String>,
}

// Numbers and booleans are kept in their JSON spelling, like the string casts
// of the columnar loaders. Arrays and objects become missing values.
fn raw_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Some(s),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Designation,
    DiscoveryDate,
    HMag,
    MoidAu,
    QAu1,
    QAu2,
    PeriodYr,
    IDeg,
    Pha,
    OrbitClass,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Designation,
        Field::DiscoveryDate,
        Field::HMag,
        Field::MoidAu,
        Field::QAu1,
        Field::QAu2,
        Field::PeriodYr,
        Field::IDeg,
        Field::Pha,
        Field::OrbitClass,
    ];

    /// Key of the field in the source files.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Designation => "designation",
            Field::DiscoveryDate => "discovery_date",
            Field::HMag => "h_mag",
            Field::MoidAu => "moid_au",
            Field::QAu1 => "q_au_1",
            Field::QAu2 => "q_au_2",
            Field::PeriodYr => "period_yr",
            Field::IDeg => "i_deg",
            Field::Pha => "pha",
            Field::OrbitClass => "orbit_class",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl Record {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Designation => &self.designation,
            Field::DiscoveryDate => &self.discovery_date,
            Field::HMag => &self.h_mag,
            Field::MoidAu => &self.moid_au,
            Field::QAu1 => &self.q_au_1,
            Field::QAu2 => &self.q_au_2,
            Field::PeriodYr => &self.period_yr,
            Field::IDeg => &self.i_deg,
            Field::Pha => &self.pha,
            Field::OrbitClass => &self.orbit_class,
        };
        value.as_deref()
    }

    fn set(&mut self, field: Field, value: Option<String>) {
        let slot = match field {
            Field::Designation => &mut self.designation,
            Field::DiscoveryDate => &mut self.discovery_date,
            Field::HMag => &mut self.h_mag,
            Field::MoidAu => &mut self.moid_au,
            Field::QAu1 => &mut self.q_au_1,
            Field::QAu2 => &mut self.q_au_2,
            Field::PeriodYr => &mut self.period_yr,
            Field::IDeg => &mut self.i_deg,
            Field::Pha => &mut self.pha,
            Field::OrbitClass => &mut self.orbit_class,
        };
        *slot = value;
    }
}

/// Immutable set of records, shared between the grid and its projections.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    records: Arc<Vec<Record>>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(records),
        }
    }

    /// The dataset compiled into the binary.
    pub fn bundled() -> Result<Self, NeoError> {
        let records: Vec<Record> = serde_json::from_str(BUNDLED)?;
        debug!("Bundled dataset holds {} records", records.len());
        Ok(Dataset::new("near-earth-asteroids", records))
    }

    #[instrument]
    pub fn load(path: PathBuf) -> Result<Self, NeoError> {
        let file_type = Dataset::check_file(&path)?;
        let start_time = Instant::now();
        let records = match file_type {
            FileType::JSON => serde_json::from_slice(&fs::read(&path)?)?,
            FileType::CSV => Dataset::records_from_frame(Dataset::load_csv(&path)?)?,
            FileType::PARQUET => Dataset::records_from_frame(Dataset::load_parquet(&path)?)?,
            FileType::ARROW => Dataset::records_from_frame(Dataset::load_arrow(&path)?)?,
        };
        info!(
            "Loading {} records took {}ms ...",
            records.len(),
            start_time.elapsed().as_millis()
        );

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        Ok(Dataset::new(name, records))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn detect_file_type(path: &Path) -> Result<FileType, NeoError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("JSON") => Ok(FileType::JSON),
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(NeoError::UnknownFileType),
        }
    }

    fn check_file(path: &Path) -> Result<FileType, NeoError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => NeoError::FileNotFound,
            ErrorKind::PermissionDenied => NeoError::PermissionDenied,
            _ => NeoError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(NeoError::LoadingFailed("Not a file!".into()));
        }
        Dataset::detect_file_type(path)
    }

    // Columnar sources are read as strings, one rayon task per column,
    // then zipped back into records by field name.
    fn records_from_frame(frame: LazyFrame) -> Result<Vec<Record>, NeoError> {
        let df = frame.collect()?;
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let columns: Result<Vec<(Field, Vec<Option<String>>)>, PolarsError> = names
            .par_iter()
            .filter_map(|name| match Field::from_key(name) {
                Some(field) => Some((field, name)),
                None => {
                    warn!("Ignoring unknown column \"{name}\"");
                    None
                }
            })
            .map(|(field, name)| Dataset::load_column(&df, name).map(|data| (field, data)))
            .collect();
        let columns: HashMap<Field, Vec<Option<String>>> = columns?.into_iter().collect();

        let mut records = vec![Record::default(); df.height()];
        for (field, data) in columns {
            for (record, value) in records.iter_mut().zip(data) {
                record.set(field, value);
            }
        }
        Ok(records)
    }

    fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Option<String>>, PolarsError> {
        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        Ok(series
            .into_iter()
            .map(|value| value.map(|s| s.to_string()))
            .collect())
    }

    fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
        // Read everything as strings; coercion happens per column later on.
        LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
    }

    fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
    }

    fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}
