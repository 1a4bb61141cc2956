//! Telemetry documents
//!
//! Profile JSON written by geninfo, lcov and genhtml is loosely typed: keys
//! come and go between versions and values are occasionally strings. Loading
//! turns the raw JSON into one typed profile per producing tool. Absent keys
//! become `None`/[`Field::Absent`], values of the wrong type are kept as
//! [`Field::Invalid`] so the sheet writers can report exactly which record
//! was skipped.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Per-file geninfo categories, in column order
///
/// order: order of processing; file: time to process one GCDA file;
/// parse: time to generate and read gcov data; exec: time to execute gcov;
/// append: time to merge file info into the parent.
pub const GENINFO_FILE_KEYS: [&str; 5] = ["order", "file", "parse", "exec", "append"];

/// Extra per-file categories reported with `--verbose`
pub const GENINFO_EXTENDED_KEYS: [&str; 2] = ["read", "translate"];

/// Per-chunk geninfo categories
///
/// work: process_one_chunk plus merge; chunk: fork() to end of cleanup after
/// the merge; queue: child finish to start of merge in the parent; child:
/// child start to just before serialize; process: process_one_chunk call;
/// undump: deserialize chunk data; merge: merge returned chunk info.
pub const GENINFO_CHUNK_KEYS: [&str; 7] = [
    "work", "chunk", "queue", "child", "process", "undump", "merge",
];

/// Scalar geninfo timings, one row each
pub const GENINFO_SPECIAL_KEYS: [&str; 4] = ["total", "parallel", "filter", "write"];

/// Filter-stage geninfo categories
pub const GENINFO_FILTER_KEYS: [&str; 6] = [
    "filt_chunk",
    "filt_queue",
    "filt_child",
    "filt_proc",
    "filt_undump",
    "filt_merge",
];

/// Top-level geninfo counts listed with the configuration
pub const GENINFO_COUNT_KEYS: [&str; 4] = ["chunkSize", "nChunks", "nFiles", "interval"];

/// Scalar timings of an lcov run or segment
pub const LCOV_SCALAR_KEYS: [&str; 3] = ["total", "merge", "undump"];

/// Per-file timing tables of an lcov run or segment
pub const LCOV_SERIES_KEYS: [&str; 2] = ["parse", "append"];

/// Optional genhtml parse-phase timings
pub const GENHTML_PARSE_KEYS: [&str; 4] =
    ["parse_source", "parse_diff", "parse_current", "parse_baseline"];

/// genhtml column titles; the first column holds the `file`/`dir` value
pub const GENHTML_KEYS: [&str; 8] = [
    "total",
    "child",
    "annotate",
    "synth",
    "categorize",
    "source",
    "check_version",
    "html",
];

/// Scalars recognised in documents from an unknown tool
pub const GENERIC_SCALAR_KEYS: [&str; 5] = [
    "parse_source",
    "parse_diff",
    "emit",
    "parse_current",
    "parse_baseline",
];

/// Nested series recognised in documents from an unknown tool
pub const GENERIC_SERIES_KEYS: [&str; 15] = [
    "file",
    "dir",
    "load",
    "synth",
    "check_version",
    "annotate",
    "parse",
    "append",
    "segment",
    "undump",
    "merge",
    "gen_info",
    "data",
    "graph",
    "find",
];

/// Top-level keys consumed by the sheet header
const HEADER_KEYS: [&str; 3] = ["config", "overall", "total"];

/// Errors that make a whole document unusable
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("unable to read: {0}")]
    Read(#[from] std::io::Error),

    #[error("unable to parse: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unable to parse: expected a JSON object at top level")]
    NotAnObject,
}

/// A possibly missing, possibly malformed value
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Absent,
    /// Present but unusable; holds the raw JSON text
    Invalid(String),
    Present(T),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl Field<f64> {
    fn from_json(value: Option<&Value>) -> Self {
        match value {
            None => Field::Absent,
            Some(v) => match coerce_number(v) {
                Some(n) => Field::Present(n),
                None => Field::Invalid(v.to_string()),
            },
        }
    }

    pub fn number(&self) -> Option<f64> {
        self.value().copied()
    }
}

/// Numeric view of a JSON value; numeric strings are accepted
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// A category's values keyed by item (file, chunk, directory)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    entries: Vec<(String, Field<f64>)>,
    index: HashMap<String, usize>,
}

impl Series {
    fn from_entries(entries: Vec<(String, Field<f64>)>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();
        Self { entries, index }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        Self::from_entries(
            map.iter()
                .map(|(k, v)| (k.clone(), Field::from_json(Some(v))))
                .collect(),
        )
    }

    /// Read `object[key]` as a series, logging a non-object value
    fn lookup(source: &str, object: &Map<String, Value>, key: &str) -> Option<Self> {
        match object.get(key)? {
            Value::Object(map) => Some(Self::from_map(map)),
            other => {
                warn!(
                    "{}: expected an object for '{}', found {}",
                    source,
                    key,
                    json_kind(other)
                );
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field<f64>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries sorted lexically by key
    pub fn sorted(&self) -> Vec<(&str, &Field<f64>)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.field(key).and_then(|f| f.number())
    }

    /// Raw entry for `key`, including invalid values
    pub fn field(&self, key: &str) -> Option<&Field<f64>> {
        self.index.get(key).map(|i| &self.entries[*i].1)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self::from_entries(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Field::Present(v)))
                .collect(),
        )
    }
}

/// A configuration value as written to the sheet
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Text(String),
    Number(f64),
}

/// The `config` block of a document, sorted by key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentConfig {
    entries: BTreeMap<String, ConfigValue>,
}

impl DocumentConfig {
    fn from_map(map: &Map<String, Value>) -> Self {
        let mut entries = BTreeMap::new();
        for (key, value) in map {
            let converted = if key == "tool" || key == "date" {
                match value {
                    Value::String(s) => Some(ConfigValue::Text(s.clone())),
                    Value::Number(n) => Some(ConfigValue::Text(n.to_string())),
                    _ => None,
                }
            } else {
                match value {
                    Value::Number(n) => n.as_f64().map(ConfigValue::Number),
                    Value::Bool(b) => Some(ConfigValue::Number(if *b { 1.0 } else { 0.0 })),
                    _ => None,
                }
            };

            // unknown config formats are skipped quietly
            match converted {
                Some(v) => {
                    entries.insert(key.clone(), v);
                }
                None => debug!("skipping config entry '{}' = {}", key, value),
            }
        }
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Producer of a document, from `config.tool`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Geninfo,
    Lcov,
    Genhtml,
    Unknown,
}

impl ToolKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "geninfo" => ToolKind::Geninfo,
            "lcov" => ToolKind::Lcov,
            "genhtml" => ToolKind::Genhtml,
            _ => ToolKind::Unknown,
        }
    }
}

/// geninfo: per-chunk and per-file timing series
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeninfoProfile {
    /// `chunkSize`, `nChunks`, `nFiles`, `interval` when present
    pub counts: Vec<(&'static str, f64)>,
    pub parallel: Field<f64>,
    pub filter: Field<f64>,
    pub write: Field<f64>,
    /// Directory scan durations
    pub find: Option<Series>,
    series: HashMap<&'static str, Series>,
}

impl GeninfoProfile {
    fn from_object(source: &str, object: &Map<String, Value>) -> Self {
        let counts = GENINFO_COUNT_KEYS
            .iter()
            .filter_map(|k| object.get(*k).and_then(coerce_number).map(|v| (*k, v)))
            .collect();

        let mut series = HashMap::new();
        let keys = GENINFO_FILE_KEYS
            .iter()
            .chain(GENINFO_EXTENDED_KEYS.iter())
            .chain(GENINFO_CHUNK_KEYS.iter())
            .chain(GENINFO_FILTER_KEYS.iter());
        for key in keys {
            if let Some(s) = Series::lookup(source, object, key) {
                series.insert(*key, s);
            }
        }

        Self {
            counts,
            parallel: Field::from_json(object.get("parallel")),
            filter: Field::from_json(object.get("filter")),
            write: Field::from_json(object.get("write")),
            find: Series::lookup(source, object, "find"),
            series,
        }
    }

    /// Scalar special by name (`parallel`, `filter`, `write`)
    pub fn special(&self, key: &str) -> &Field<f64> {
        static ABSENT: Field<f64> = Field::Absent;
        match key {
            "parallel" => &self.parallel,
            "filter" => &self.filter,
            "write" => &self.write,
            _ => &ABSENT,
        }
    }

    pub fn series(&self, key: &str) -> Option<&Series> {
        self.series.get(key)
    }

    pub fn set_series(&mut self, key: &'static str, series: Series) {
        self.series.insert(key, series);
    }
}

/// Timings of one lcov run or segment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LcovSegment {
    /// `total`, `merge`, `undump` in that order
    pub scalars: Vec<(&'static str, Field<f64>)>,
    /// `parse`, `append` per-file tables in that order
    pub tables: Vec<(&'static str, Option<Series>)>,
}

impl LcovSegment {
    fn from_object(source: &str, object: &Map<String, Value>) -> Self {
        Self {
            scalars: LCOV_SCALAR_KEYS
                .iter()
                .map(|k| (*k, Field::from_json(object.get(*k))))
                .collect(),
            tables: LCOV_SERIES_KEYS
                .iter()
                .map(|k| (*k, Series::lookup(source, object, k)))
                .collect(),
        }
    }
}

/// lcov: one block, or one block per segment when `config.segments` is set
#[derive(Debug, Clone, PartialEq)]
pub enum LcovProfile {
    Flat(LcovSegment),
    /// Segment index and its data; `None` for a segment missing from the document
    Segmented(Vec<(usize, Option<LcovSegment>)>),
}

impl LcovProfile {
    fn from_object(source: &str, object: &Map<String, Value>, segments: Option<usize>) -> Self {
        let Some(count) = segments else {
            return LcovProfile::Flat(LcovSegment::from_object(source, object));
        };

        // scan up to the highest segment key present; the count may be far larger
        let scanned = object
            .keys()
            .filter_map(|k| k.parse::<usize>().ok())
            .filter(|seg| *seg < count)
            .max()
            .map_or(0, |seg| seg + 1);
        if scanned < count {
            warn!(
                "{}: no data for segments {}..{}",
                source, scanned, count
            );
        }

        let blocks = (0..scanned)
            .map(|seg| {
                let data = match object.get(&seg.to_string()) {
                    Some(Value::Object(map)) => Some(LcovSegment::from_object(source, map)),
                    Some(other) => {
                        warn!(
                            "{}: segment {} is {}, not an object",
                            source,
                            seg,
                            json_kind(other)
                        );
                        None
                    }
                    None => None,
                };
                (seg, data)
            })
            .collect();
        LcovProfile::Segmented(blocks)
    }
}

/// genhtml: per-file/per-directory sizes and timing categories
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenhtmlProfile {
    /// Parse-phase timings present in the document
    pub parse: Vec<(&'static str, f64)>,
    pub file: Option<Series>,
    pub dir: Option<Series>,
    timings: HashMap<&'static str, Series>,
}

impl GenhtmlProfile {
    fn from_object(source: &str, object: &Map<String, Value>) -> Self {
        let parse = GENHTML_PARSE_KEYS
            .iter()
            .filter_map(|k| object.get(*k).and_then(coerce_number).map(|v| (*k, v)))
            .collect();

        let mut timings = HashMap::new();
        for key in &GENHTML_KEYS[1..] {
            if let Some(s) = Series::lookup(source, object, key) {
                timings.insert(*key, s);
            }
        }

        Self {
            parse,
            file: Series::lookup(source, object, "file"),
            dir: Series::lookup(source, object, "dir"),
            timings,
        }
    }

    /// Timing series for a category (`child` .. `html`)
    pub fn timing(&self, key: &str) -> Option<&Series> {
        self.timings.get(key)
    }

    pub fn set_timing(&mut self, key: &'static str, series: Series) {
        self.timings.insert(key, series);
    }
}

/// One top-level key of a document from an unrecognised tool
#[derive(Debug, Clone, PartialEq)]
pub enum GenericEntry {
    Scalar(String, Field<f64>),
    Series(String, Series),
    Unrecognized(String),
}

/// Fallback for documents from an unrecognised tool, in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericProfile {
    pub entries: Vec<GenericEntry>,
}

impl GenericProfile {
    fn from_object(source: &str, object: &Map<String, Value>) -> Self {
        let mut entries = Vec::new();
        for (key, value) in object {
            if HEADER_KEYS.contains(&key.as_str()) {
                continue;
            }
            if GENERIC_SCALAR_KEYS.contains(&key.as_str()) {
                entries.push(GenericEntry::Scalar(
                    key.clone(),
                    Field::from_json(Some(value)),
                ));
            } else if GENERIC_SERIES_KEYS.contains(&key.as_str()) {
                if let Some(series) = Series::lookup(source, object, key) {
                    entries.push(GenericEntry::Series(key.clone(), series));
                }
            } else {
                entries.push(GenericEntry::Unrecognized(key.clone()));
            }
        }
        Self { entries }
    }
}

/// Tool-specific content of a document
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Geninfo(GeninfoProfile),
    Lcov(LcovProfile),
    Genhtml(GenhtmlProfile),
    Generic(GenericProfile),
}

/// A parsed telemetry document
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryDocument {
    pub path: PathBuf,
    /// `config.tool`, or `"unknown"`
    pub tool: String,
    pub config: DocumentConfig,
    /// Overall elapsed time (`total`, or legacy `overall`)
    pub total: Field<f64>,
    pub profile: Profile,
}

impl TelemetryDocument {
    /// Read and classify a document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_json_str(path, &text)
    }

    /// Classify JSON text that was read from `path`
    pub fn from_json_str(path: &Path, text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(path, &value)
    }

    pub fn from_value(path: &Path, value: &Value) -> Result<Self, DocumentError> {
        let object = value.as_object().ok_or(DocumentError::NotAnObject)?;
        let source = path.display().to_string();

        let raw_config = object.get("config").and_then(Value::as_object);
        let tool = raw_config
            .and_then(|c| c.get("tool"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let tool = match tool {
            Some(t) => t,
            None => {
                warn!("{}: unknown tool", source);
                "unknown".to_string()
            }
        };

        let config = raw_config
            .map(DocumentConfig::from_map)
            .unwrap_or_default();

        let total = match object.get("overall") {
            Some(v) => Field::from_json(Some(v)),
            None => Field::from_json(object.get("total")),
        };

        let profile = match ToolKind::from_name(&tool) {
            ToolKind::Geninfo => Profile::Geninfo(GeninfoProfile::from_object(&source, object)),
            ToolKind::Lcov => {
                let segments = raw_config.and_then(|c| c.get("segments"));
                let segments = match segments {
                    None => None,
                    Some(v) => match v.as_u64() {
                        Some(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
                        None => {
                            warn!(
                                "{}: config.segments is not a count ({}), treating run as unsegmented",
                                source, v
                            );
                            None
                        }
                    },
                };
                Profile::Lcov(LcovProfile::from_object(&source, object, segments))
            }
            ToolKind::Genhtml => Profile::Genhtml(GenhtmlProfile::from_object(&source, object)),
            ToolKind::Unknown => Profile::Generic(GenericProfile::from_object(&source, object)),
        };

        Ok(Self {
            path: path.to_path_buf(),
            tool,
            config,
            total,
            profile,
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self.profile {
            Profile::Geninfo(_) => ToolKind::Geninfo,
            Profile::Lcov(_) => ToolKind::Lcov,
            Profile::Genhtml(_) => ToolKind::Genhtml,
            Profile::Generic(_) => ToolKind::Unknown,
        }
    }

    /// Source path as shown in sheets and diagnostics
    pub fn source(&self) -> String {
        self.path.display().to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> TelemetryDocument {
        TelemetryDocument::from_value(Path::new("run/profile.json"), &value).unwrap()
    }

    #[test]
    fn test_missing_tool_defaults_to_unknown() {
        let d = doc(json!({"emit": 1.5}));
        assert_eq!(d.tool, "unknown");
        assert_eq!(d.kind(), ToolKind::Unknown);
        assert!(d.config.is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        let err = TelemetryDocument::from_value(Path::new("x.json"), &json!([1, 2])).unwrap_err();
        assert!(matches!(err, DocumentError::NotAnObject));
    }

    #[test]
    fn test_parse_error_is_document_error() {
        let err = TelemetryDocument::from_json_str(Path::new("x.json"), "{not json").unwrap_err();
        assert!(err.to_string().starts_with("unable to parse"));
    }

    #[test]
    fn test_config_conversion() {
        let d = doc(json!({
            "config": {
                "tool": "geninfo",
                "date": "2024-01-01",
                "maxParallel": 8,
                "pedantic": true,
                "version": "2.0-1",
                "nested": {"a": 1}
            }
        }));
        let entries: Vec<_> = d.config.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("date", &ConfigValue::Text("2024-01-01".into())),
                ("maxParallel", &ConfigValue::Number(8.0)),
                ("pedantic", &ConfigValue::Number(1.0)),
                ("tool", &ConfigValue::Text("geninfo".into())),
            ]
        );
    }

    #[test]
    fn test_series_keeps_invalid_entries() {
        let d = doc(json!({
            "config": {"tool": "lcov"},
            "parse": {"a.c": 1.5, "b.c": "2.5", "c.c": [1]}
        }));
        let Profile::Lcov(LcovProfile::Flat(seg)) = d.profile else {
            panic!("expected flat lcov profile");
        };
        let parse = seg.tables[0].1.as_ref().unwrap();
        assert_eq!(parse.get("a.c"), Some(1.5));
        assert_eq!(parse.get("b.c"), Some(2.5));
        assert_eq!(parse.get("c.c"), None);
        assert_eq!(parse.len(), 3);
    }

    #[test]
    fn test_lcov_segments_detected_from_config() {
        let d = doc(json!({
            "config": {"tool": "lcov", "segments": 2},
            "total": 5,
            "0": {"total": 2, "merge": 1, "undump": 0.5},
            "1": {"total": 3}
        }));
        let Profile::Lcov(LcovProfile::Segmented(blocks)) = d.profile else {
            panic!("expected segmented lcov profile");
        };
        assert_eq!(blocks.len(), 2);
        let first = blocks[0].1.as_ref().unwrap();
        assert_eq!(first.scalars[0], ("total", Field::Present(2.0)));
        let second = blocks[1].1.as_ref().unwrap();
        assert_eq!(second.scalars[1], ("merge", Field::Absent));
    }

    #[test]
    fn test_lcov_missing_segment_is_none() {
        let d = doc(json!({"config": {"tool": "lcov", "segments": 3}, "0": {}, "2": {}}));
        let Profile::Lcov(LcovProfile::Segmented(blocks)) = d.profile else {
            panic!("expected segmented lcov profile");
        };
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].1.is_some());
        assert!(blocks[1].1.is_none());
        assert!(blocks[2].1.is_some());
    }

    #[test]
    fn test_lcov_segment_beyond_key_count_is_kept() {
        let d = doc(json!({"config": {"tool": "lcov", "segments": 3}, "2": {"total": 4}}));
        let Profile::Lcov(LcovProfile::Segmented(blocks)) = d.profile else {
            panic!("expected segmented lcov profile");
        };
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].1.is_none());
        assert!(blocks[1].1.is_none());
        let last = blocks[2].1.as_ref().unwrap();
        assert_eq!(last.scalars[0], ("total", Field::Present(4.0)));
    }

    #[test]
    fn test_lcov_trailing_missing_segments_are_not_scanned() {
        let d = doc(json!({"config": {"tool": "lcov", "segments": 4}, "0": {}, "7": {}}));
        let Profile::Lcov(LcovProfile::Segmented(blocks)) = d.profile else {
            panic!("expected segmented lcov profile");
        };
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_lcov_huge_segment_count_is_bounded() {
        let d = doc(json!({
            "config": {"tool": "lcov", "segments": u64::MAX},
            "0": {"total": 1},
            "5": {"total": 2}
        }));
        let Profile::Lcov(LcovProfile::Segmented(blocks)) = d.profile else {
            panic!("expected segmented lcov profile");
        };
        assert_eq!(blocks.len(), 6);
        assert!(blocks[0].1.is_some());
        assert!(blocks[5].1.is_some());
    }

    #[test]
    fn test_overall_is_legacy_total() {
        let d = doc(json!({"config": {"tool": "genhtml"}, "overall": 12.0}));
        assert_eq!(d.total, Field::Present(12.0));
    }

    #[test]
    fn test_geninfo_series_and_specials() {
        let d = doc(json!({
            "config": {"tool": "geninfo"},
            "total": 10,
            "parallel": "n/a",
            "nFiles": 2,
            "file": {"a.gcda": 1.0},
            "order": {"a.gcda": 0},
            "find": {"/src": 0.2},
            "work": 7
        }));
        let Profile::Geninfo(g) = d.profile else {
            panic!("expected geninfo profile");
        };
        assert_eq!(g.counts, vec![("nFiles", 2.0)]);
        assert_eq!(g.parallel, Field::Invalid("\"n/a\"".into()));
        assert!(g.filter.is_absent());
        assert_eq!(g.series("file").unwrap().get("a.gcda"), Some(1.0));
        assert!(g.find.is_some());
        // scalar where a series is expected is dropped
        assert!(g.series("work").is_none());
    }

    #[test]
    fn test_generic_entries_in_document_order() {
        let d = doc(json!({
            "emit": 2.0,
            "weird": 1,
            "config": {},
            "load": {"b": 1, "a": 2}
        }));
        let Profile::Generic(g) = d.profile else {
            panic!("expected generic profile");
        };
        assert_eq!(g.entries.len(), 3);
        assert!(matches!(&g.entries[0], GenericEntry::Scalar(k, _) if k == "emit"));
        assert!(matches!(&g.entries[1], GenericEntry::Unrecognized(k) if k == "weird"));
        let GenericEntry::Series(_, load) = &g.entries[2] else {
            panic!("expected series");
        };
        let keys: Vec<_> = load.sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_series_iter_preserves_document_order() {
        let d = doc(json!({"config": {"tool": "geninfo"}, "file": {"z": 1, "a": 2, "m": 3}}));
        let Profile::Geninfo(g) = d.profile else {
            panic!("expected geninfo profile");
        };
        let keys: Vec<_> = g.series("file").unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
