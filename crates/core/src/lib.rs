//! # Clinic Core
//!
//! Core business logic for the clinic back-office.
//!
//! This crate contains pure domain computations and the snapshot source they read from:
//! - Role/permission evaluation against a static access-level map
//! - Invoice derivation from examination snapshots (line sums, discounts, totals, age display)
//! - Clinic-local date/time rendering and free-text date parsing
//!
//! **No API concerns**: HTTP servers, request parsing and CLI handling belong in `api-rest`,
//! `api-shared` and `cli`.

pub mod age;
pub mod clinic_time;
pub mod config;
pub mod constants;
pub mod error;
pub mod examination;
pub mod fuzzy_date;
pub mod invoice;
pub mod permissions;

pub use age::{kid_age, KidAge};
pub use clinic_time::ClinicTime;
pub use config::CoreConfig;
pub use constants::DEFAULT_DATA_DIR;
pub use error::{ClinicError, ClinicResult};
pub use examination::{
    DiscountItem, DiscountKind, ExaminationId, ExaminationSnapshot, ExaminationSource,
    FileExaminationSource, MedicineItem, ServiceItem,
};
pub use fuzzy_date::parse_fuzzy_date;
pub use invoice::{derive_invoice, InvoiceRecord, InvoiceService};
pub use permissions::{
    resolve_level, AccessLevelMap, PermissionResolver, PermissionSet, Tier, TierRequirements,
};
