use geojson::{GeoJson, Geometry, JsonObject, JsonValue, Value};
use serde::Deserialize;
use std::borrow::{Borrow, Cow};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Error, Result};
use crate::source::{RecordTransform, Source};

/// One raw data row: `{id, lat?, lon?, isPentagon?, ...fields}`
pub type Record = JsonObject;

/// A polygon ring of (lon, lat) vertices
pub type Ring = Vec<(f64, f64)>;

/// Fields describing cell placement rather than data
pub const RESERVED_KEYS: [&str; 3] = ["lat", "lon", "isPentagon"];

/// Cell identifier. Numeric JSON ids are kept in their printed form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "JsonValue")]
pub struct CellId(String);

impl CellId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Read an id from a JSON scalar; objects, arrays, bools and null are not ids
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(s) => Some(Self(s.clone())),
            JsonValue::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<JsonValue> for CellId {
    type Error = String;

    fn try_from(value: JsonValue) -> std::result::Result<Self, Self::Error> {
        Self::from_json(&value).ok_or_else(|| format!("invalid cell id: {}", value))
    }
}

impl Borrow<str> for CellId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CellId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A polygon of the base grid. Cells without vertices produce no features.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub vertices: Option<Ring>,
}

impl Cell {
    pub fn new(id: impl Into<CellId>, vertices: Ring) -> Self {
        Self {
            id: id.into(),
            vertices: Some(vertices),
        }
    }
}

#[derive(Deserialize)]
struct RawCell {
    id: CellId,
    #[serde(default)]
    vertices: Option<Vec<[f64; 2]>>,
}

impl From<RawCell> for Cell {
    fn from(raw: RawCell) -> Self {
        Self {
            id: raw.id,
            vertices: raw
                .vertices
                .map(|ring| ring.into_iter().map(|[lon, lat]| (lon, lat)).collect()),
        }
    }
}

/// Decode a grid from JSON: either a `[{id, vertices}]` list or a GeoJSON
/// object whose polygon features carry an `id` property.
pub fn cells_from_slice(bytes: &mut [u8]) -> Result<Vec<Cell>> {
    let value: JsonValue = simd_json::serde::from_slice(bytes)?;
    match value {
        JsonValue::Array(_) => {
            let raw: Vec<RawCell> =
                serde_json::from_value(value).map_err(|e| Error::Grid(e.to_string()))?;
            Ok(raw.into_iter().map(Cell::from).collect())
        }
        JsonValue::Object(object) => {
            let geojson = GeoJson::from_json_object(object).map_err(|e| Error::Grid(e.to_string()))?;
            Ok(cells_from_geojson(&geojson))
        }
        other => Err(Error::Grid(format!("expected a cell list or GeoJSON, got {}", other))),
    }
}

/// Read and decode a grid file, see [`cells_from_slice`]
pub fn cells_from_path(path: &Path) -> Result<Vec<Cell>> {
    let mut bytes = fs::read(path)?;
    cells_from_slice(&mut bytes)
}

/// Extract cells from polygon features. The exterior ring is the cell;
/// features without a usable `id` property are skipped.
pub fn cells_from_geojson(geojson: &GeoJson) -> Vec<Cell> {
    let mut cells = Vec::new();
    let mut add_feature = |feature: &geojson::Feature| {
        let id = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("id"))
            .and_then(CellId::from_json);
        let Some(id) = id else {
            log::warn!("skipping grid feature without id");
            return;
        };
        let vertices = feature.geometry.as_ref().and_then(exterior_ring);
        cells.push(Cell { id, vertices });
    };

    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.iter().for_each(&mut add_feature),
        GeoJson::Feature(f) => add_feature(f),
        GeoJson::Geometry(_) => log::warn!("bare geometry has no cell id"),
    }
    cells
}

fn exterior_ring(geometry: &Geometry) -> Option<Ring> {
    let rings = match &geometry.value {
        Value::Polygon(rings) => rings,
        Value::MultiPolygon(polygons) => polygons.first()?,
        _ => return None,
    };
    rings
        .first()
        .map(|exterior| exterior.iter().map(|c| (c[0], c[1])).collect())
}

/// A loaded dataset for one source
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub resolution: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub data: Vec<Record>,
}

impl Payload {
    pub fn new(data: Vec<Record>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Decode `{resolution?, url?, data: [...]}` from JSON bytes (parsed in place)
    pub fn from_slice(bytes: &mut [u8]) -> Result<Self> {
        Ok(simd_json::serde::from_slice(bytes)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let mut bytes = fs::read(path)?;
        Self::from_slice(&mut bytes)
    }
}

/// Cell position found in the data, for grid generation
#[derive(Clone, Debug, PartialEq)]
pub struct CellPoint {
    pub id: CellId,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub is_pentagon: Option<bool>,
}

/// Cells discovered across all sources, deduplicated by id
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellPoints {
    pub resolution: Option<u32>,
    pub url: Option<String>,
    pub points: Vec<CellPoint>,
}

/// Records of one source, in payload order, with id lookup
#[derive(Clone, Default)]
struct SourceRecords {
    records: Vec<(CellId, Record)>,
    by_id: HashMap<CellId, usize>,
    transform: Option<RecordTransform>,
    keys: Vec<String>,
}

impl SourceRecords {
    fn build(source: &Source) -> Self {
        let mut out = Self {
            transform: source.transform.clone(),
            ..Self::default()
        };
        let Some(payload) = &source.payload else {
            return out;
        };

        for record in &payload.data {
            let Some(id) = record.get("id").and_then(CellId::from_json) else {
                log::warn!("skipping record without a scalar id");
                continue;
            };
            match out.by_id.get(&id).copied() {
                // Ids are unique per source; a repeated id replaces the earlier row
                Some(slot) => out.records[slot].1 = record.clone(),
                None => {
                    out.by_id.insert(id.clone(), out.records.len());
                    out.records.push((id, record.clone()));
                }
            }
        }

        out.keys = match &source.keys {
            Some(keys) => keys.clone(),
            None => out
                .records
                .first()
                .map(|(_, sample)| {
                    sample
                        .keys()
                        .filter(|k| !RESERVED_KEYS.contains(&k.as_str()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
        };
        out
    }

    #[inline(always)]
    fn map<'a>(&self, record: &'a Record) -> Cow<'a, Record> {
        match &self.transform {
            Some(transform) => Cow::Owned(transform(record)),
            None => Cow::Borrowed(record),
        }
    }

    fn get(&self, id: &str) -> Option<&Record> {
        self.by_id.get(id).map(|&slot| &self.records[slot].1)
    }
}

/// Per-source id → record index
#[derive(Clone, Default)]
pub struct DataIndex {
    sources: Vec<SourceRecords>,
}

impl DataIndex {
    /// Index every source's payload. Sources must agree on resolution; the
    /// first disagreement is reported once to `sink`. Returns `None` for the
    /// cell points when there are no sources at all.
    pub fn index(sources: &[Source], sink: &mut dyn DiagnosticSink) -> (Self, Option<CellPoints>) {
        let index = Self {
            sources: sources.iter().map(SourceRecords::build).collect(),
        };
        if sources.is_empty() {
            return (index, None);
        }

        let mut points = CellPoints::default();
        let mut seen: HashSet<&CellId> = HashSet::new();
        let mut reference: Option<Option<u32>> = None;
        let mut mismatch: Option<Diagnostic> = None;

        for (source_index, source) in sources.iter().enumerate() {
            let Some(payload) = &source.payload else {
                continue;
            };

            match reference {
                Some(expected @ Some(_)) if expected != payload.resolution => {
                    mismatch.get_or_insert(Diagnostic::ResolutionMismatch {
                        expected,
                        found: payload.resolution,
                        source_index,
                    });
                }
                Some(Some(_)) => {}
                _ => reference = Some(payload.resolution),
            }

            if payload.url.is_some() {
                points.url = payload.url.clone();
            }

            let records = &index.sources[source_index];
            for (id, record) in &records.records {
                if !seen.insert(id) {
                    continue;
                }
                let lat = record.get("lat").and_then(JsonValue::as_f64);
                let lon = record.get("lon").and_then(JsonValue::as_f64);
                points.points.push(CellPoint {
                    id: id.clone(),
                    lat,
                    lon: lat.and(lon),
                    is_pentagon: lat.and(record.get("isPentagon").and_then(JsonValue::as_bool)),
                });
            }
        }

        points.resolution = reference.flatten();
        if let Some(diagnostic) = mismatch {
            sink.report(diagnostic);
        }
        log::debug!(
            "indexed {} sources, {} distinct cells",
            sources.len(),
            points.points.len()
        );
        (index, Some(points))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Keys exposed as feature properties: the configured allow-list, or the
    /// keys of a sample record minus the placement fields
    pub fn keys_for(&self, source_index: usize) -> &[String] {
        self.sources
            .get(source_index)
            .map(|s| s.keys.as_slice())
            .unwrap_or(&[])
    }

    /// Transformed record restricted to `keys_for`. Unknown ids give an empty map.
    pub fn properties_for(&self, source_index: usize, id: &str) -> Record {
        let Some(source) = self.sources.get(source_index) else {
            return Record::new();
        };
        let Some(record) = source.get(id) else {
            return Record::new();
        };
        let mapped = source.map(record);
        source
            .keys
            .iter()
            .filter_map(|k| mapped.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }

    /// Untransformed record, including fields outside the key set
    pub fn raw_record_for(&self, source_index: usize, id: &str) -> Option<&Record> {
        self.sources.get(source_index)?.get(id)
    }

    /// All records of a source with the record transform applied
    pub fn mapped_records(&self, source_index: usize) -> impl Iterator<Item = Cow<'_, Record>> {
        self.sources
            .get(source_index)
            .into_iter()
            .flat_map(|source| source.records.iter().map(move |(_, r)| source.map(r)))
    }
}

#[cfg(test)]
pub(crate) fn records(value: JsonValue) -> Vec<Record> {
    match value {
        JsonValue::Array(rows) => rows
            .into_iter()
            .filter_map(|row| match row {
                JsonValue::Object(o) => Some(o),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
