// =============================================================================
// store.rs - Stockage des préférences / Preference storage
// =============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::color::ColorFormat;
use crate::config;
use crate::error::StoreError;

// =============================================================================
// INTERFACE DE STOCKAGE
// STORAGE INTERFACE
// =============================================================================

/// Stockage clé / valeur asynchrone
/// Asynchronous key / value storage
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Lit une clé, `None` si absente
    /// Reads a key, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Écrit une clé
    /// Writes a key
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

// =============================================================================
// STOCKAGE EN MÉMOIRE
// IN-MEMORY STORAGE
// =============================================================================

/// Stockage limité à la durée du processus
/// Store living for the process only
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pré-remplit une clé / Pre-fills a key
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        if let Ok(mut data) = self.data.lock() {
            data.insert(key.to_string(), value.into());
        }
        self
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let data = self.data.lock().map_err(|_| poisoned())?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut data = self.data.lock().map_err(|_| poisoned())?;
        data.insert(key.to_string(), value);
        Ok(())
    }
}

// =============================================================================
// STOCKAGE FICHIER JSON
// JSON FILE STORAGE
// =============================================================================

/// Stockage adossé à un objet JSON plat sur disque
/// Store backed by a flat JSON object on disk, e.g. `{ "colorFormat": "rgb" }`
///
/// Unknown keys are kept as-is. A corrupt file reads as empty.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(data) => data,
                Err(err) => {
                    warn!("Ignoring corrupt settings file {}: {}", path.display(), err);
                    Map::new()
                }
            }
        } else {
            Map::new()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(data)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serialized)?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let data = self.data.read().map_err(|_| poisoned())?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|_| poisoned())?;
        data.insert(key.to_string(), value);
        self.persist(&data)
    }
}

/// Ouvre le fichier désigné par `EYEDROPPER_SETTINGS`, s'il est défini
/// Opens the file named by `EYEDROPPER_SETTINGS`, if set
pub fn open_configured() -> Result<Option<JsonFileStore>> {
    config::settings_path()
        .map(JsonFileStore::open)
        .transpose()
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("settings lock poisoned".to_string())
}

// =============================================================================
// PRÉFÉRENCES
// PREFERENCES
// =============================================================================

/// Accès typé au format choisi, avec notification de changement
/// Typed access to the chosen format, with change notification
pub struct Preferences<S> {
    store: S,
    changes: watch::Sender<ColorFormat>,
}

impl<S: SettingsStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        let (changes, _) = watch::channel(ColorFormat::default());
        Self { store, changes }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored format. A missing key is `None`; a value that is not one of the
    /// five names reads as `hex`.
    pub async fn stored_format(&self) -> Result<Option<ColorFormat>, StoreError> {
        let value = self.store.get(config::COLOR_FORMAT_KEY).await?;
        Ok(value.map(|value| match value {
            Value::String(name) => ColorFormat::parse_or_default(&name),
            _ => ColorFormat::default(),
        }))
    }

    /// Format courant ; toute erreur donne le format par défaut
    /// Current format; any failure gives the default format
    pub async fn color_format(&self) -> ColorFormat {
        match self.stored_format().await {
            Ok(format) => format.unwrap_or_default(),
            Err(err) => {
                warn!("Failed to get color format: {}", err);
                ColorFormat::default()
            }
        }
    }

    /// Enregistre un format et prévient les abonnés
    /// Saves a format and notifies subscribers
    pub async fn save_format(&self, format: ColorFormat) -> Result<(), StoreError> {
        self.store
            .set(config::COLOR_FORMAT_KEY, Value::from(format.as_str()))
            .await?;
        self.changes.send_replace(format);
        info!("Color format saved: {}", format);
        Ok(())
    }

    /// Écrit le format par défaut au premier lancement seulement
    /// Writes the default format on first run only
    ///
    /// Returns `true` when the default was written.
    pub async fn ensure_default(&self) -> Result<bool, StoreError> {
        if self.store.get(config::COLOR_FORMAT_KEY).await?.is_some() {
            return Ok(false);
        }
        let format = ColorFormat::default();
        self.store
            .set(config::COLOR_FORMAT_KEY, Value::from(format.as_str()))
            .await?;
        info!("First run: color format set to {}", format);
        Ok(true)
    }

    pub fn subscribe(&self) -> watch::Receiver<ColorFormat> {
        self.changes.subscribe()
    }
}

// =============================================================================
// TESTS
// =============================================================================
