pub mod errors;
mod s3;

use chrono::{DateTime, Local};
use log::{error, info};
use crate::config::StorageParameters;
use crate::manager_storage::errors::{StorageError, StoreError};
use crate::manager_storage::s3::S3Store;
use crate::manager_weather::DataKind;
use crate::manager_weather::models::WeatherRecord;

const CONTENT_TYPE_JSON: &str = "application/json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// The operations needed from an object store
pub trait ObjectStore {
    /// Checks whether the bucket exists, `StoreError::NotFound` if it doesn't
    fn head_bucket(&self, bucket: &str) -> Result<(), StoreError>;
    fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError>;
    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError>;
}

/// Struct for provisioning the bucket and writing weather data to it
pub struct Storage {
    store: Box<dyn ObjectStore>,
    bucket_name: String,
    region: String,
    key_prefix: String,
}

impl Storage {
    /// Returns a Storage struct backed by S3
    ///
    /// # Arguments
    ///
    /// * 'config' - storage configuration
    pub fn new(config: &StorageParameters) -> Result<Storage, StoreError> {
        let store = S3Store::new(config)?;

        Ok(Storage::with_store(config, Box::new(store)))
    }

    /// Returns a Storage struct backed by the given object store
    ///
    /// # Arguments
    ///
    /// * 'config' - storage configuration
    /// * 'store' - object store to use
    pub fn with_store(config: &StorageParameters, store: Box<dyn ObjectStore>) -> Storage {
        Storage {
            store,
            bucket_name: config.bucket_name.clone(),
            region: config.region.clone(),
            key_prefix: config.key_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Makes sure the bucket exists, creating it in the configured region if it doesn't.
    /// Nothing is returned, failures are logged and later writes will fail on their own.
    /// Only a bucket reported as not found is created, any other head failure is logged.
    pub fn ensure_bucket_exists(&self) {
        match self.store.head_bucket(&self.bucket_name) {
            Ok(()) => {
                info!("bucket '{}' already exists", self.bucket_name);
            },
            Err(StoreError::NotFound) => {
                info!("creating bucket '{}'", self.bucket_name);
                match self.store.create_bucket(&self.bucket_name, &self.region) {
                    Ok(()) => info!("bucket '{}' created successfully in '{}'", self.bucket_name, self.region),
                    Err(e) => error!("failed to create bucket '{}': {}", self.bucket_name, e),
                }
            },
            Err(e) => {
                error!("unable to check bucket '{}', not attempting to create it: {}", self.bucket_name, e);
            }
        }
    }

    /// Saves weather data to the bucket, stamped with the current local time.
    /// Returns true if the data was written.
    ///
    /// # Arguments
    ///
    /// * 'data' - weather data to save
    /// * 'city' - the city the data belongs to
    /// * 'kind' - the kind of weather data
    pub fn save_to_storage(&self, data: Option<&WeatherRecord>, city: &str, kind: DataKind) -> bool {
        self.save_at(data, city, kind, Local::now())
    }

    /// Saves weather data to the bucket, stamped with the given capture time.
    /// Returns true if the data was written.
    ///
    /// # Arguments
    ///
    /// * 'data' - weather data to save
    /// * 'city' - the city the data belongs to
    /// * 'kind' - the kind of weather data
    /// * 'captured' - capture time used for the timestamp field and the object key
    pub fn save_at(&self, data: Option<&WeatherRecord>, city: &str, kind: DataKind, captured: DateTime<Local>) -> bool {
        match self.try_save(data, city, kind, captured) {
            Ok(key) => {
                info!("saved '{}' data for '{}' as '{}' successfully", kind, city, key);
                true
            },
            Err(StorageError::NoData) => {
                error!("no data provided for '{}' weather", kind);
                false
            },
            Err(e) => {
                error!("failed to save '{}' data for '{}': {}", kind, city, e);
                false
            }
        }
    }

    /// Stamps, serializes and writes a record, returning the object key written to
    ///
    /// # Arguments
    ///
    /// * 'data' - weather data to save
    /// * 'city' - the city the data belongs to
    /// * 'kind' - the kind of weather data
    /// * 'captured' - capture time
    fn try_save(&self, data: Option<&WeatherRecord>, city: &str, kind: DataKind, captured: DateTime<Local>) -> Result<String, StorageError> {
        let record = data
            .filter(|r| !r.is_empty())
            .ok_or(StorageError::NoData)?;
        if !record.is_object() {
            return Err(StorageError::NotAnObject);
        }

        let timestamp = captured.format(TIMESTAMP_FORMAT).to_string();
        let key = object_key(&self.key_prefix, kind, city, &timestamp);
        let body = record.stamped(&timestamp).to_json()?;

        info!("saving {} data for {} to bucket '{}'", kind, city, self.bucket_name);
        self.store.put_object(&self.bucket_name, &key, body.into_bytes(), CONTENT_TYPE_JSON)?;

        Ok(key)
    }
}

/// Builds the object key `<prefix>/<kind>/<city>-<timestamp>.json`
///
/// # Arguments
///
/// * 'prefix' - key prefix
/// * 'kind' - the kind of weather data
/// * 'city' - the city the data belongs to
/// * 'timestamp' - formatted capture timestamp
fn object_key(prefix: &str, kind: DataKind, city: &str, timestamp: &str) -> String {
    format!("{}/{}/{}-{}.json", prefix, kind, city, timestamp)
}
