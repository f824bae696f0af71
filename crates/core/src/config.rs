//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    ACTIVITY_DIR_NAME, APPOINTMENTS_DIR_NAME, PATIENTS_DIR_NAME, SEQUENCE_FILENAME,
    TRACKINGS_DIR_NAME, VISITS_DIR_NAME,
};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    record_data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at the given data directory.
    pub fn new(record_data_dir: PathBuf) -> Self {
        Self { record_data_dir }
    }

    pub fn record_data_dir(&self) -> &Path {
        &self.record_data_dir
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.record_data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn trackings_dir(&self) -> PathBuf {
        self.record_data_dir.join(TRACKINGS_DIR_NAME)
    }

    pub fn visits_dir(&self) -> PathBuf {
        self.record_data_dir.join(VISITS_DIR_NAME)
    }

    pub fn appointments_dir(&self) -> PathBuf {
        self.record_data_dir.join(APPOINTMENTS_DIR_NAME)
    }

    pub fn activity_dir(&self) -> PathBuf {
        self.record_data_dir.join(ACTIVITY_DIR_NAME)
    }

    pub fn sequence_file(&self) -> PathBuf {
        self.record_data_dir.join(SEQUENCE_FILENAME)
    }
}
