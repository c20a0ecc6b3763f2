use crate::error::SharingError;
use crate::ratio::CompressionRatio;
use crate::wire::WireFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ranks that always write diagnostic dumps when a log directory is set.
pub const DIAGNOSTIC_RANKS: usize = 2;

/// How parameter collections are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionOrder {
    /// Insertion-ordered names, identical on every peer.
    #[default]
    Ordered,
    /// Hash-ordered collections. Not supported: flat positions would not
    /// line up across peers.
    Unordered,
}

/// Whether peers also exchange raw training samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSharing {
    #[default]
    Disabled,
    /// Not supported.
    Raw,
}

/// Per-peer sharing configuration.
///
/// # Example
/// ```
/// use deltashare_core::{SharingConfig, WireFormat};
///
/// let config: SharingConfig = serde_json::from_str(
///     r#"{"alpha": 0.1, "wire_format": "flat"}"#,
/// ).unwrap();
/// assert_eq!(config.alpha.alpha(), 0.1);
/// assert_eq!(config.wire_format, WireFormat::Flat);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingConfig {
    pub alpha: CompressionRatio,
    pub collection: CollectionOrder,
    pub dataset_sharing: DatasetSharing,
    pub wire_format: WireFormat,
    /// Write diagnostic dumps even on ranks past [`DIAGNOSTIC_RANKS`].
    pub save_shared: bool,
    /// Root folder for diagnostic dumps; no dumps without it.
    pub log_dir: Option<PathBuf>,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            alpha: CompressionRatio::FULL,
            collection: CollectionOrder::Ordered,
            dataset_sharing: DatasetSharing::Disabled,
            wire_format: WireFormat::Nested,
            save_shared: false,
            log_dir: None,
        }
    }
}

impl SharingConfig {
    pub fn with_alpha(alpha: f64) -> Result<Self, SharingError> {
        Ok(Self {
            alpha: CompressionRatio::new(alpha)?,
            ..Self::default()
        })
    }

    /// Reject variants the protocol cannot run with.
    pub fn validate(&self) -> Result<(), SharingError> {
        if self.collection == CollectionOrder::Unordered {
            return Err(SharingError::UnsupportedConfig(
                "unordered parameter collections".into(),
            ));
        }
        if self.dataset_sharing == DatasetSharing::Raw {
            return Err(SharingError::UnsupportedConfig("raw dataset sharing".into()));
        }
        Ok(())
    }

    /// Dump folder for `rank`, if this peer writes diagnostic dumps.
    pub fn dump_dir(&self, rank: usize) -> Option<PathBuf> {
        let log_dir = self.log_dir.as_ref()?;
        if self.save_shared || rank < DIAGNOSTIC_RANKS {
            Some(log_dir.join("shared_params").join(rank.to_string()))
        } else {
            None
        }
    }
}
