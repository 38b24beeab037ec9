//! Invoice derivation.
//!
//! Turns an [`ExaminationSnapshot`] into a print-ready [`InvoiceRecord`]: 1-based line order,
//! per-line sums, totals, clinic-local date and time, and the patient's bucketed age.
//!
//! Money is in đồng (`i64`). The derivation is pure: the same snapshot, `now` and clinic time
//! always give the same record. All arithmetic is checked; overflow surfaces as
//! [`ClinicError::Overflow`] rather than wrapping.
//!
//! Totals are built in this order, because discounts depend on the subtotal:
//! 1. `serviceTotal` = Σ unit price × quantity
//! 2. `subTotal` = `serviceTotal` + examination fee
//! 3. `discountTotal` = Σ discount sums (percentages taken of `subTotal`)
//! 4. `finalTotal` = `subTotal` − `discountTotal`, which may be negative

use crate::age::kid_age;
use crate::constants::DISCOUNT_ROUNDING_STEP;
use crate::examination::{DiscountItem, DiscountKind, ExaminationSnapshot};
use crate::{ClinicError, ClinicResult, ClinicTime, CoreConfig};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::NonEmptyText;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceServiceLine {
    pub order: usize,
    pub name: NonEmptyText,
    pub unit_price: i64,
    pub quantity: i64,
    pub sum: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMedicineLine {
    pub order: usize,
    pub name: NonEmptyText,
    pub quantity: i64,
    pub unit: String,
    pub dosage: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDiscountLine {
    pub order: usize,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: i64,
    pub description: String,
    /// `"đ"` or `"%"`; labels `value` only.
    pub unit: &'static str,
    /// Amount deducted, always in đồng.
    pub sum: i64,
}

/// Print-ready view of an examination. Built per request, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub birth_date: NaiveDate,
    pub examined_at: DateTime<Utc>,
    pub examination_fee: i64,
    pub services: Vec<InvoiceServiceLine>,
    pub medicines: Vec<InvoiceMedicineLine>,
    pub discounts: Vec<InvoiceDiscountLine>,
    pub service_total: i64,
    pub sub_total: i64,
    pub discount_total: i64,
    pub final_total: i64,
    pub examine_date: String,
    pub examine_time: String,
    pub kid_age: String,
}

impl InvoiceRecord {
    pub fn to_json_pretty(&self) -> ClinicResult<String> {
        serde_json::to_string_pretty(self).map_err(ClinicError::Serialization)
    }
}

/// Derive the invoice for `snapshot` as seen at `now`.
///
/// `now` only feeds the age display; the examination date and time come from the snapshot.
///
/// # Errors
///
/// Returns `ClinicError::Overflow` if any line sum or total does not fit in an `i64`.
pub fn derive_invoice(
    snapshot: &ExaminationSnapshot,
    now: DateTime<Utc>,
    clinic_time: &ClinicTime,
) -> ClinicResult<InvoiceRecord> {
    let age = kid_age(snapshot.birth_date, clinic_time.date_of(now));

    let mut service_total: i64 = 0;
    let mut services = Vec::with_capacity(snapshot.services.len());
    for (index, item) in snapshot.services.iter().enumerate() {
        let sum = item
            .unit_price
            .checked_mul(item.quantity)
            .ok_or(ClinicError::Overflow("service line sum"))?;
        service_total = service_total
            .checked_add(sum)
            .ok_or(ClinicError::Overflow("service total"))?;
        services.push(InvoiceServiceLine {
            order: index + 1,
            name: item.name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            sum,
        });
    }

    let medicines = snapshot
        .medicines
        .iter()
        .enumerate()
        .map(|(index, item)| InvoiceMedicineLine {
            order: index + 1,
            name: item.name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            dosage: item.dosage.clone(),
        })
        .collect();

    let examination_fee = snapshot.examination_fee.unwrap_or(0);
    let sub_total = service_total
        .checked_add(examination_fee)
        .ok_or(ClinicError::Overflow("subtotal"))?;

    let mut discount_total: i64 = 0;
    let mut discounts = Vec::with_capacity(snapshot.discounts.len());
    for (index, item) in snapshot.discounts.iter().enumerate() {
        let sum = discount_amount(item, sub_total)?;
        discount_total = discount_total
            .checked_add(sum)
            .ok_or(ClinicError::Overflow("discount total"))?;
        discounts.push(InvoiceDiscountLine {
            order: index + 1,
            kind: item.kind,
            value: item.value,
            description: item.description.clone(),
            unit: item.kind.unit(),
            sum,
        });
    }

    let final_total = sub_total
        .checked_sub(discount_total)
        .ok_or(ClinicError::Overflow("final total"))?;

    tracing::debug!(
        service_total,
        sub_total,
        discount_total,
        final_total,
        "derived invoice"
    );

    Ok(InvoiceRecord {
        birth_date: snapshot.birth_date,
        examined_at: snapshot.examined_at,
        examination_fee,
        services,
        medicines,
        discounts,
        service_total,
        sub_total,
        discount_total,
        final_total,
        examine_date: clinic_time.format_date(snapshot.examined_at),
        examine_time: clinic_time.format_time(snapshot.examined_at),
        kid_age: age.to_string(),
    })
}

/// Amount deducted by one discount.
///
/// Percentages are taken of `sub_total` and rounded to the nearest
/// [`DISCOUNT_ROUNDING_STEP`] đồng, halves away from zero.
fn discount_amount(discount: &DiscountItem, sub_total: i64) -> ClinicResult<i64> {
    match discount.kind {
        DiscountKind::Fix => Ok(discount.value),
        DiscountKind::Percent => {
            let step = i128::from(DISCOUNT_ROUNDING_STEP);
            let numerator = i128::from(sub_total) * i128::from(discount.value);
            let steps = div_round_half_away_from_zero(numerator, 100 * step);
            i64::try_from(steps * step).map_err(|_| ClinicError::Overflow("percent discount"))
        }
    }
}

fn div_round_half_away_from_zero(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator.abs() {
        quotient + numerator.signum() * denominator.signum()
    } else {
        quotient
    }
}

/// Derives invoices using the configured clinic time.
#[derive(Clone, Debug)]
pub struct InvoiceService {
    cfg: Arc<CoreConfig>,
}

impl InvoiceService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn derive(
        &self,
        snapshot: &ExaminationSnapshot,
        now: DateTime<Utc>,
    ) -> ClinicResult<InvoiceRecord> {
        derive_invoice(snapshot, now, self.cfg.clinic_time())
    }
}
