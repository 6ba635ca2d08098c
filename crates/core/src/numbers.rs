//! Patient number generation.
//!
//! Deployments call an external procedure for this, so the source is a
//! boundary trait; whatever stands behind it must guarantee the returned
//! value is unique across all time. The in-process implementation keeps the
//! same `PT-YYYYMMDD-NNNN` shape the external procedure produces.

use crate::store::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Prefix of every generated patient number.
pub const PATIENT_NUMBER_PREFIX: &str = "PT";

/// Source of fresh patient numbers.
#[async_trait]
pub trait PatientNumberSource: Send + Sync {
    /// Produce the next patient number.
    ///
    /// # Errors
    ///
    /// Remote implementations report [`StoreError::Transport`] when the
    /// generation call cannot be completed.
    async fn next_number(&self) -> Result<String, StoreError>;
}

/// In-process generator producing `PT-YYYYMMDD-NNNN`.
///
/// One counter per UTC date stamp: sequences restart at `0001` each day and
/// the date stamp keeps the full number unique across days.
#[derive(Default)]
pub struct DailySequenceSource {
    counters: Mutex<HashMap<String, u32>>,
}

impl DailySequenceSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientNumberSource for DailySequenceSource {
    async fn next_number(&self) -> Result<String, StoreError> {
        let stamp = Utc::now().format("%Y%m%d").to_string();
        let mut counters = self.counters.lock().await;
        let sequence = counters.entry(stamp.clone()).or_insert(0);
        *sequence += 1;
        Ok(format!("{PATIENT_NUMBER_PREFIX}-{stamp}-{sequence:04}"))
    }
}

/// Whether a string has the generated patient number shape.
///
/// Sequences wider than four digits stay well formed; the zero padding is a
/// minimum, not a cap.
pub fn is_well_formed(number: &str) -> bool {
    let mut parts = number.split('-');
    let (Some(prefix), Some(stamp), Some(sequence), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    prefix == PATIENT_NUMBER_PREFIX
        && stamp.len() == 8
        && stamp.chars().all(|c| c.is_ascii_digit())
        && sequence.len() >= 4
        && sequence.chars().all(|c| c.is_ascii_digit())
}
