//! Examination snapshots and where they come from.
//!
//! A snapshot is a denormalised, point-in-time copy of an examination: the services rendered,
//! medicines dispensed and discounts applied. It is the only input the invoice engine needs.
//!
//! Snapshots are fetched through the [`ExaminationSource`] trait. The shipped implementation,
//! [`FileExaminationSource`], reads one YAML document per examination from
//! `<data_dir>/examinations/<id>.yaml`.

use crate::constants::{
    EXAMINATIONS_DIR_NAME, EXAMINATION_FILE_EXTENSION, FIX_DISCOUNT_UNIT, PERCENT_DISCOUNT_UNIT,
};
use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::{NonEmptyText, SlugId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identifier of an examination; safe to use as a file stem.
pub type ExaminationId = SlugId;

/// How a discount value is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `value` is an amount in đồng.
    Fix,
    /// `value` is a percentage of the subtotal.
    Percent,
}

impl DiscountKind {
    /// Display label printed next to the discount value.
    pub fn unit(self) -> &'static str {
        match self {
            DiscountKind::Fix => FIX_DISCOUNT_UNIT,
            DiscountKind::Percent => PERCENT_DISCOUNT_UNIT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceItem {
    pub name: NonEmptyText,
    /// Price of one unit, in đồng.
    pub unit_price: i64,
    pub quantity: i64,
}

/// A dispensed medicine. Informational only: medicines carry no price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MedicineItem {
    pub name: NonEmptyText,
    pub quantity: i64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub dosage: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DiscountItem {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: i64,
    #[serde(default)]
    pub description: String,
}

/// Point-in-time copy of an examination, as needed for invoicing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExaminationSnapshot {
    pub birth_date: NaiveDate,
    pub examined_at: DateTime<Utc>,
    /// Base examination fee in đồng; absent means no fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examination_fee: Option<i64>,
    #[serde(default)]
    pub services: Vec<ServiceItem>,
    #[serde(default)]
    pub medicines: Vec<MedicineItem>,
    #[serde(default)]
    pub discounts: Vec<DiscountItem>,
}

impl ExaminationSnapshot {
    /// Parse a snapshot from YAML text and validate it.
    ///
    /// This uses `serde_path_to_error` so schema errors name the failing field
    /// (e.g. `services[0].unitPrice`).
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Translation` if the YAML does not match the snapshot schema
    /// (including unknown keys), or `ClinicError::InvalidInput` if [`Self::validate`] fails.
    pub fn parse_yaml(yaml_text: &str) -> ClinicResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let snapshot = match serde_path_to_error::deserialize::<_, Self>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(ClinicError::Translation(format!(
                    "examination schema mismatch at {path}: {source}"
                )));
            }
        };

        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the monetary and quantity fields.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::InvalidInput` if a fee, price, quantity or fixed discount is
    /// negative, or if a percentage discount is outside `0..=100`.
    pub fn validate(&self) -> ClinicResult<()> {
        if let Some(fee) = self.examination_fee {
            if fee < 0 {
                return Err(ClinicError::InvalidInput(
                    "examinationFee cannot be negative".into(),
                ));
            }
        }

        for (i, service) in self.services.iter().enumerate() {
            if service.unit_price < 0 || service.quantity < 0 {
                return Err(ClinicError::InvalidInput(format!(
                    "services[{i}] ({}) has a negative price or quantity",
                    service.name
                )));
            }
        }

        for (i, medicine) in self.medicines.iter().enumerate() {
            if medicine.quantity < 0 {
                return Err(ClinicError::InvalidInput(format!(
                    "medicines[{i}] ({}) has a negative quantity",
                    medicine.name
                )));
            }
        }

        for (i, discount) in self.discounts.iter().enumerate() {
            let ok = match discount.kind {
                DiscountKind::Fix => discount.value >= 0,
                DiscountKind::Percent => (0..=100).contains(&discount.value),
            };
            if !ok {
                return Err(ClinicError::InvalidInput(format!(
                    "discounts[{i}] has an out-of-range {} value: {}",
                    discount.kind.unit(),
                    discount.value
                )));
            }
        }

        Ok(())
    }
}

/// Supplies examination snapshots by identifier.
pub trait ExaminationSource: Send + Sync {
    /// Fetch the snapshot for `id`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::ExaminationNotFound` if no such examination exists.
    fn fetch(&self, id: &ExaminationId) -> ClinicResult<ExaminationSnapshot>;
}

/// Reads snapshots from `<data_dir>/examinations/<id>.yaml`.
#[derive(Clone, Debug)]
pub struct FileExaminationSource {
    examinations_dir: PathBuf,
}

impl FileExaminationSource {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            examinations_dir: data_dir.join(EXAMINATIONS_DIR_NAME),
        }
    }

    /// Path of the snapshot file for `id`.
    pub fn snapshot_path(&self, id: &ExaminationId) -> PathBuf {
        self.examinations_dir
            .join(format!("{id}.{EXAMINATION_FILE_EXTENSION}"))
    }
}

impl ExaminationSource for FileExaminationSource {
    fn fetch(&self, id: &ExaminationId) -> ClinicResult<ExaminationSnapshot> {
        let path = self.snapshot_path(id);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClinicError::ExaminationNotFound(id.to_string()));
            }
            Err(e) => return Err(ClinicError::FileRead(e)),
        };

        ExaminationSnapshot::parse_yaml(&text).map_err(|e| {
            tracing::warn!("failed to parse examination {}: {}", path.display(), e);
            e
        })
    }
}
