//! Durable garden store.
//!
//! One pretty-printed JSON document holds every plant and island record plus
//! the last visit time. The in-memory snapshot is authoritative; `save`
//! always overwrites the whole file through a temp file and rename.
//!
//! Failures never escape `load`/`save`: an unreadable or corrupt file loads
//! as an empty garden, and a failed write is logged.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use skygarden_logic::config::SaveFileName;
use skygarden_logic::kinds::{IslandKind, PlantKind};

use crate::components::EntityId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("garden file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("garden file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantRecord {
    pub id: EntityId,
    pub kind: PlantKind,
    pub growth: f32,
    #[serde(with = "rfc3339_seconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandRecord {
    pub id: EntityId,
    pub kind: IslandKind,
}

/// Everything the garden persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenSnapshot {
    #[serde(default)]
    pub plant_map: BTreeMap<EntityId, PlantRecord>,
    #[serde(default)]
    pub island_map: BTreeMap<EntityId, IslandRecord>,
    /// Kept as text so an unparseable value only loses the catch-up, not the garden
    #[serde(default)]
    pub last_visit_timestamp: Option<String>,
}

impl GardenSnapshot {
    pub fn is_empty(&self) -> bool {
        self.plant_map.is_empty() && self.island_map.is_empty()
    }

    pub fn last_visit(&self) -> Option<DateTime<Utc>> {
        let text = self.last_visit_timestamp.as_deref()?;
        match DateTime::parse_from_rfc3339(text) {
            Ok(time) => Some(time.with_timezone(&Utc)),
            Err(e) => {
                log::warn!("ignoring unparseable last visit timestamp {:?}: {}", text, e);
                None
            }
        }
    }
}

pub struct GardenStore {
    path: PathBuf,
    snapshot: GardenSnapshot,
}

impl GardenStore {
    /// A store backed by `path`. Nothing is read until [`GardenStore::load`].
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: GardenSnapshot::default(),
        }
    }

    pub fn open_in(dir: impl AsRef<Path>, file_name: &SaveFileName) -> Self {
        Self::open(dir.as_ref().join(&file_name.0))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory snapshot with the file's contents.
    pub fn load(&mut self) -> &GardenSnapshot {
        self.snapshot = match read_snapshot(&self.path) {
            Ok(Some(snapshot)) => {
                log::info!(
                    "loaded garden from {}: {} plants, {} islands",
                    self.path.display(),
                    snapshot.plant_map.len(),
                    snapshot.island_map.len()
                );
                snapshot
            }
            Ok(None) => {
                log::info!("no saved garden at {}, starting empty", self.path.display());
                GardenSnapshot::default()
            }
            Err(e) => {
                log::warn!("could not load {}, starting empty: {}", self.path.display(), e);
                GardenSnapshot::default()
            }
        };
        &self.snapshot
    }

    /// Persist the snapshot. Returns false (after logging) on failure.
    pub fn save(&self) -> bool {
        match self.try_save() {
            Ok(()) => {
                log::info!(
                    "saved garden to {}: {} plants, {} islands",
                    self.path.display(),
                    self.snapshot.plant_map.len(),
                    self.snapshot.island_map.len()
                );
                true
            }
            Err(e) => {
                log::error!("failed to save garden to {}: {}", self.path.display(), e);
                false
            }
        }
    }

    pub fn try_save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.snapshot)?;
        write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }

    pub fn snapshot(&self) -> &GardenSnapshot {
        &self.snapshot
    }

    pub fn plant(&self, id: EntityId) -> Option<&PlantRecord> {
        self.snapshot.plant_map.get(&id)
    }

    pub fn island(&self, id: EntityId) -> Option<&IslandRecord> {
        self.snapshot.island_map.get(&id)
    }

    pub fn upsert_plant(&mut self, record: PlantRecord) {
        self.snapshot.plant_map.insert(record.id, record);
    }

    pub fn upsert_island(&mut self, record: IslandRecord) {
        self.snapshot.island_map.insert(record.id, record);
    }

    /// Drop a record and persist right away. Returns whether one existed.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let removed = self.snapshot.plant_map.remove(&id).is_some()
            | self.snapshot.island_map.remove(&id).is_some();
        if removed {
            self.save();
        } else {
            log::warn!("no record for {} to remove", id);
        }
        removed
    }

    /// Forget every record and persist the empty garden.
    pub fn clear(&mut self) {
        self.snapshot.plant_map.clear();
        self.snapshot.island_map.clear();
        self.save();
    }

    pub fn plants_by_kind(&self) -> BTreeMap<PlantKind, Vec<EntityId>> {
        let mut groups: BTreeMap<PlantKind, Vec<EntityId>> = BTreeMap::new();
        for record in self.snapshot.plant_map.values() {
            groups.entry(record.kind).or_default().push(record.id);
        }
        groups
    }

    pub fn islands_by_kind(&self) -> BTreeMap<IslandKind, Vec<EntityId>> {
        let mut groups: BTreeMap<IslandKind, Vec<EntityId>> = BTreeMap::new();
        for record in self.snapshot.island_map.values() {
            groups.entry(record.kind).or_default().push(record.id);
        }
        groups
    }

    /// `now - lastVisitTimestamp`, or `None` without a usable timestamp.
    pub fn time_since_last_visit(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.snapshot.last_visit().map(|last| now - last)
    }

    pub fn stamp_visit(&mut self, now: DateTime<Utc>) {
        self.snapshot.last_visit_timestamp = Some(format_timestamp(now));
    }
}

impl std::fmt::Debug for GardenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GardenStore")
            .field("path", &self.path)
            .field("plants", &self.snapshot.plant_map.len())
            .field("islands", &self.snapshot.island_map.len())
            .finish()
    }
}

/// Sortable UTC timestamp with second precision, e.g. `2024-05-01T12:00:00Z`.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// "1d 2h 3m 4s" style, leading zero units omitted.
pub fn humanize(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        (total % 86_400) / 3600,
        (total % 3600) / 60,
        total % 60,
    );
    if days > 0 {
        format!("{}{}d {}h {}m {}s", sign, days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}{}h {}m {}s", sign, hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}{}m {}s", sign, minutes, seconds)
    } else {
        format!("{}{}s", sign, seconds)
    }
}

fn read_snapshot(path: &Path) -> Result<Option<GardenSnapshot>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&text)?))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("garden");
    path.with_file_name(format!("{}.tmp", file_name))
}

mod rfc3339_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
