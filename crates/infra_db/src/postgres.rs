//! PostgreSQL billing store
//!
//! Implements [`BillingStore`] on SQLx. Each [`BillingTx`] wraps one
//! PostgreSQL transaction; dropping it without committing rolls it back.
//!
//! Two statements carry the concurrency contract:
//!
//! - stock debits are a single conditional `UPDATE ... WHERE stock_qty >= $n`
//!   rather than a read followed by a write, so concurrent dispensing can
//!   never take stock negative;
//! - settlement reads the invoice with `FOR UPDATE`, serializing concurrent
//!   settle/confirm attempts so exactly one records a settlement.
//!
//! Expected tables: `medicines`, `prescriptions`, `prescription_lines`,
//! `rooms`, `stays`, `invoices`, `settlements`. Monetary columns are a
//! `NUMERIC` amount paired with a 3-letter currency code; enums are stored
//! as lowercase text.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use core_kernel::{
    Currency, InvoiceId, MedicineId, Money, PatientId, PortError, PrescriptionId, RoomId, StayId,
};
use domain_admissions::{InpatientStay, Room, RoomClass, StayStatus};
use domain_billing::{
    BillingStore, BillingTx, ClinicalReference, Invoice, InvoiceCategory, InvoiceStatus,
    Settlement, SettlementMethod, StockDebit,
};
use domain_pharmacy::{Medicine, Prescription, PrescriptionLine};

use crate::error::DatabaseError;

/// PostgreSQL-backed implementation of the billing store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new store over an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_err(error: sqlx::Error) -> PortError {
    PortError::from(DatabaseError::from(error))
}

fn currency_from_code(code: &str) -> Result<Currency, PortError> {
    match code {
        "IDR" => Ok(Currency::IDR),
        "USD" => Ok(Currency::USD),
        "SGD" => Ok(Currency::SGD),
        other => Err(PortError::internal(format!(
            "unknown currency code in database: {other}"
        ))),
    }
}

fn money_from_row(row: &PgRow, amount_col: &str, currency_col: &str) -> Result<Money, PortError> {
    let amount: Decimal = row.try_get(amount_col).map_err(map_err)?;
    let code: String = row.try_get(currency_col).map_err(map_err)?;
    Ok(Money::new(amount, currency_from_code(&code)?))
}

fn category_code(category: InvoiceCategory) -> &'static str {
    match category {
        InvoiceCategory::Consultation => "consultation",
        InvoiceCategory::Medication => "medication",
        InvoiceCategory::InpatientStay => "inpatient_stay",
    }
}

fn category_from_code(code: &str) -> Result<InvoiceCategory, PortError> {
    match code {
        "consultation" => Ok(InvoiceCategory::Consultation),
        "medication" => Ok(InvoiceCategory::Medication),
        "inpatient_stay" => Ok(InvoiceCategory::InpatientStay),
        other => Err(PortError::internal(format!(
            "unknown invoice category in database: {other}"
        ))),
    }
}

fn status_code(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Unpaid => "unpaid",
        InvoiceStatus::Paid => "paid",
    }
}

fn status_from_code(code: &str) -> Result<InvoiceStatus, PortError> {
    match code {
        "unpaid" => Ok(InvoiceStatus::Unpaid),
        "paid" => Ok(InvoiceStatus::Paid),
        other => Err(PortError::internal(format!(
            "unknown invoice status in database: {other}"
        ))),
    }
}

fn method_code(method: SettlementMethod) -> &'static str {
    match method {
        SettlementMethod::BankTransfer => "bank_transfer",
        SettlementMethod::QrCode => "qr_code",
        SettlementMethod::Cash => "cash",
        SettlementMethod::CreditCard => "credit_card",
        SettlementMethod::DebitCard => "debit_card",
        SettlementMethod::InsuranceProgram => "insurance_program",
    }
}

fn method_from_code(code: &str) -> Result<SettlementMethod, PortError> {
    match code {
        "bank_transfer" => Ok(SettlementMethod::BankTransfer),
        "qr_code" => Ok(SettlementMethod::QrCode),
        "cash" => Ok(SettlementMethod::Cash),
        "credit_card" => Ok(SettlementMethod::CreditCard),
        "debit_card" => Ok(SettlementMethod::DebitCard),
        "insurance_program" => Ok(SettlementMethod::InsuranceProgram),
        other => Err(PortError::internal(format!(
            "unknown settlement method in database: {other}"
        ))),
    }
}

fn room_class_from_code(code: &str) -> Result<RoomClass, PortError> {
    match code {
        "vip" => Ok(RoomClass::Vip),
        "class_1" => Ok(RoomClass::Class1),
        "class_2" => Ok(RoomClass::Class2),
        "class_3" => Ok(RoomClass::Class3),
        other => Err(PortError::internal(format!(
            "unknown room class in database: {other}"
        ))),
    }
}

fn invoice_from_row(row: &PgRow) -> Result<Invoice, PortError> {
    let reference_type: Option<String> = row.try_get("reference_type").map_err(map_err)?;
    let reference_id: Option<Uuid> = row.try_get("reference_id").map_err(map_err)?;
    let reference = match (reference_type.as_deref(), reference_id) {
        (Some("prescription"), Some(id)) => Some(ClinicalReference::Prescription(id.into())),
        (Some("stay"), Some(id)) => Some(ClinicalReference::Stay(id.into())),
        (Some("appointment"), Some(id)) => Some(ClinicalReference::Appointment(id.into())),
        _ => None,
    };

    let status: String = row.try_get("status").map_err(map_err)?;
    let category: String = row.try_get("category").map_err(map_err)?;
    let due_date: Option<NaiveDate> = row.try_get("due_date").map_err(map_err)?;
    let paid_at: Option<DateTime<Utc>> = row.try_get("paid_at").map_err(map_err)?;

    Ok(Invoice {
        id: InvoiceId::from_uuid(row.try_get("id").map_err(map_err)?),
        patient_id: PatientId::from_uuid(row.try_get("patient_id").map_err(map_err)?),
        category: category_from_code(&category)?,
        total: money_from_row(row, "total", "currency")?,
        status: status_from_code(&status)?,
        issued_at: row.try_get("issued_at").map_err(map_err)?,
        due_date,
        paid_at,
        reference,
    })
}

fn medicine_from_row(row: &PgRow) -> Result<Medicine, PortError> {
    let stock: i64 = row.try_get("stock_qty").map_err(map_err)?;
    Ok(Medicine {
        id: MedicineId::from_uuid(row.try_get("id").map_err(map_err)?),
        name: row.try_get("name").map_err(map_err)?,
        unit_price: money_from_row(row, "unit_price", "currency")?,
        stock: u32::try_from(stock)
            .map_err(|_| PortError::internal("negative stock quantity in database"))?,
        created_at: row.try_get("created_at").map_err(map_err)?,
        updated_at: row.try_get("updated_at").map_err(map_err)?,
    })
}

fn room_from_row(row: &PgRow) -> Result<Room, PortError> {
    let class: String = row.try_get("class").map_err(map_err)?;
    Ok(Room {
        id: RoomId::from_uuid(row.try_get("id").map_err(map_err)?),
        number: row.try_get("room_number").map_err(map_err)?,
        class: room_class_from_code(&class)?,
    })
}

fn stay_from_row(row: &PgRow) -> Result<InpatientStay, PortError> {
    let discharged_at: Option<DateTime<Utc>> = row.try_get("discharged_at").map_err(map_err)?;
    let prescription_id: Option<Uuid> = row.try_get("prescription_id").map_err(map_err)?;
    Ok(InpatientStay {
        id: StayId::from_uuid(row.try_get("id").map_err(map_err)?),
        patient_id: PatientId::from_uuid(row.try_get("patient_id").map_err(map_err)?),
        room_id: RoomId::from_uuid(row.try_get("room_id").map_err(map_err)?),
        admitted_at: row.try_get("admitted_at").map_err(map_err)?,
        discharged_at,
        status: if discharged_at.is_some() {
            StayStatus::Discharged
        } else {
            StayStatus::Admitted
        },
        prescription_id: prescription_id.map(PrescriptionId::from_uuid),
    })
}

fn settlement_from_row(row: &PgRow) -> Result<Settlement, PortError> {
    let method: String = row.try_get("method").map_err(map_err)?;
    Ok(Settlement {
        id: row.try_get::<Uuid, _>("id").map_err(map_err)?.into(),
        invoice_id: InvoiceId::from_uuid(row.try_get("invoice_id").map_err(map_err)?),
        amount: money_from_row(row, "amount", "currency")?,
        method: method_from_code(&method)?,
        external_reference: row.try_get("external_reference").map_err(map_err)?,
        settled_at: row.try_get("settled_at").map_err(map_err)?,
    })
}

fn line_from_row(row: &PgRow) -> Result<PrescriptionLine, PortError> {
    let quantity: i64 = row.try_get("quantity").map_err(map_err)?;
    Ok(PrescriptionLine {
        id: row.try_get("id").map_err(map_err)?,
        medicine_id: MedicineId::from_uuid(row.try_get("medicine_id").map_err(map_err)?),
        quantity: u32::try_from(quantity)
            .map_err(|_| PortError::internal("negative line quantity in database"))?,
        unit_price: money_from_row(row, "unit_price", "currency")?,
        instructions: row.try_get("instructions").map_err(map_err)?,
        billed: row.try_get("billed").map_err(map_err)?,
    })
}

const SELECT_INVOICE: &str = "SELECT id, patient_id, category, total, currency, status, \
     issued_at, due_date, paid_at, reference_type, reference_id FROM invoices";

const SELECT_LINES: &str = "SELECT id, medicine_id, quantity, unit_price, currency, \
     instructions, billed FROM prescription_lines WHERE prescription_id = $1 ORDER BY line_no";

#[async_trait]
impl BillingStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn BillingTx>, PortError> {
        let tx = self.pool.begin().await.map_err(map_err)?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        let row = sqlx::query(&format!("{SELECT_INVOICE} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    async fn invoices_by_patient(
        &self,
        patient_id: PatientId,
        status: Option<InvoiceStatus>,
    ) -> Result<Vec<Invoice>, PortError> {
        let rows = sqlx::query(&format!(
            "{SELECT_INVOICE} WHERE patient_id = $1 \
             AND ($2::text IS NULL OR status = $2) ORDER BY issued_at DESC"
        ))
        .bind(patient_id.as_uuid())
        .bind(status.map(status_code))
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows.iter().map(invoice_from_row).collect()
    }

    async fn settlements_for_invoice(
        &self,
        id: InvoiceId,
    ) -> Result<Vec<Settlement>, PortError> {
        let rows = sqlx::query(
            "SELECT id, invoice_id, amount, currency, method, external_reference, settled_at \
             FROM settlements WHERE invoice_id = $1 ORDER BY settled_at",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows.iter().map(settlement_from_row).collect()
    }

    async fn medicine(&self, id: MedicineId) -> Result<Option<Medicine>, PortError> {
        let row = sqlx::query(
            "SELECT id, name, unit_price, currency, stock_qty, created_at, updated_at \
             FROM medicines WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.as_ref().map(medicine_from_row).transpose()
    }

    async fn stay(&self, id: StayId) -> Result<Option<InpatientStay>, PortError> {
        let row = sqlx::query(
            "SELECT id, patient_id, room_id, admitted_at, discharged_at, prescription_id \
             FROM stays WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.as_ref().map(stay_from_row).transpose()
    }

    async fn prescription(
        &self,
        id: PrescriptionId,
    ) -> Result<Option<Prescription>, PortError> {
        let header = sqlx::query(
            "SELECT id, patient_id, prescriber_id, note, issued_at \
             FROM prescriptions WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;

        let Some(header) = header else {
            return Ok(None);
        };

        let line_rows = sqlx::query(SELECT_LINES)
            .bind(id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;

        let lines = line_rows
            .iter()
            .map(line_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Prescription {
            id,
            patient_id: PatientId::from_uuid(header.try_get("patient_id").map_err(map_err)?),
            prescriber_id: header
                .try_get::<Uuid, _>("prescriber_id")
                .map_err(map_err)?
                .into(),
            lines,
            note: header.try_get("note").map_err(map_err)?,
            issued_at: header.try_get("issued_at").map_err(map_err)?,
        }))
    }
}

/// One PostgreSQL transaction scope
struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BillingTx for PgTx {
    async fn medicine(&mut self, id: MedicineId) -> Result<Option<Medicine>, PortError> {
        let row = sqlx::query(
            "SELECT id, name, unit_price, currency, stock_qty, created_at, updated_at \
             FROM medicines WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        row.as_ref().map(medicine_from_row).transpose()
    }

    async fn try_debit_stock(
        &mut self,
        id: MedicineId,
        quantity: u32,
    ) -> Result<StockDebit, PortError> {
        // The condition and the decrement are one statement; no window exists
        // in which another transaction can observe or interleave a stale read.
        let result = sqlx::query(
            "UPDATE medicines SET stock_qty = stock_qty - $1, updated_at = NOW() \
             WHERE id = $2 AND stock_qty >= $1",
        )
        .bind(i64::from(quantity))
        .bind(id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(map_err)?;

        if result.rows_affected() == 1 {
            return Ok(StockDebit::Debited);
        }

        let available: i64 = sqlx::query_scalar("SELECT stock_qty FROM medicines WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_err)?
            .ok_or_else(|| PortError::not_found("Medicine", id))?;

        Ok(StockDebit::Insufficient {
            available: u32::try_from(available).unwrap_or(0),
        })
    }

    async fn insert_prescription(
        &mut self,
        prescription: &Prescription,
    ) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO prescriptions (id, patient_id, prescriber_id, note, issued_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(prescription.id.as_uuid())
        .bind(prescription.patient_id.as_uuid())
        .bind(prescription.prescriber_id.as_uuid())
        .bind(&prescription.note)
        .bind(prescription.issued_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_err)?;

        for (line_no, line) in prescription.lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO prescription_lines \
                 (id, prescription_id, line_no, medicine_id, quantity, unit_price, currency, \
                  instructions, billed) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(line.id)
            .bind(prescription.id.as_uuid())
            .bind(line_no as i32)
            .bind(line.medicine_id.as_uuid())
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.amount())
            .bind(line.unit_price.currency().code())
            .bind(&line.instructions)
            .bind(line.billed)
            .execute(&mut *self.tx)
            .await
            .map_err(map_err)?;
        }

        Ok(())
    }

    async fn stay_for_update(&mut self, id: StayId) -> Result<Option<InpatientStay>, PortError> {
        let row = sqlx::query(
            "SELECT id, patient_id, room_id, admitted_at, discharged_at, prescription_id \
             FROM stays WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        row.as_ref().map(stay_from_row).transpose()
    }

    async fn room(&mut self, id: RoomId) -> Result<Option<Room>, PortError> {
        let row = sqlx::query("SELECT id, room_number, class FROM rooms WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_err)?;
        row.as_ref().map(room_from_row).transpose()
    }

    async fn update_stay(&mut self, stay: &InpatientStay) -> Result<(), PortError> {
        sqlx::query("UPDATE stays SET discharged_at = $2 WHERE id = $1")
            .bind(stay.id.as_uuid())
            .bind(stay.discharged_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn unbilled_lines(
        &mut self,
        prescription_id: PrescriptionId,
    ) -> Result<Vec<PrescriptionLine>, PortError> {
        let rows = sqlx::query(&format!("{SELECT_LINES} FOR UPDATE"))
            .bind(prescription_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_err)?;
        rows.iter()
            .map(line_from_row)
            .filter(|line| line.as_ref().map_or(true, |l| !l.billed))
            .collect()
    }

    async fn mark_lines_billed(
        &mut self,
        prescription_id: PrescriptionId,
    ) -> Result<(), PortError> {
        sqlx::query("UPDATE prescription_lines SET billed = TRUE WHERE prescription_id = $1")
            .bind(prescription_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError> {
        let (reference_type, reference_id) = match invoice.reference {
            Some(ClinicalReference::Prescription(id)) => (Some("prescription"), Some(*id.as_uuid())),
            Some(ClinicalReference::Stay(id)) => (Some("stay"), Some(*id.as_uuid())),
            Some(ClinicalReference::Appointment(id)) => (Some("appointment"), Some(*id.as_uuid())),
            None => (None, None),
        };

        sqlx::query(
            "INSERT INTO invoices \
             (id, patient_id, category, total, currency, status, issued_at, due_date, paid_at, \
              reference_type, reference_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.patient_id.as_uuid())
        .bind(category_code(invoice.category))
        .bind(invoice.total.amount())
        .bind(invoice.total.currency().code())
        .bind(status_code(invoice.status))
        .bind(invoice.issued_at)
        .bind(invoice.due_date)
        .bind(invoice.paid_at)
        .bind(reference_type)
        .bind(reference_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn invoice_for_update(&mut self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        let row = sqlx::query(&format!("{SELECT_INVOICE} WHERE id = $1 FOR UPDATE"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_err)?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    async fn mark_invoice_paid(
        &mut self,
        id: InvoiceId,
        paid_at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE invoices SET status = 'paid', paid_at = $2 \
             WHERE id = $1 AND status = 'unpaid'",
        )
        .bind(id.as_uuid())
        .bind(paid_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::conflict(format!(
                "invoice {id} is not in the unpaid state"
            )));
        }
        Ok(())
    }

    async fn insert_settlement(&mut self, settlement: &Settlement) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO settlements \
             (id, invoice_id, amount, currency, method, external_reference, settled_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(settlement.id.as_uuid())
        .bind(settlement.invoice_id.as_uuid())
        .bind(settlement.amount.amount())
        .bind(settlement.amount.currency().code())
        .bind(method_code(settlement.method))
        .bind(&settlement.external_reference)
        .bind(settlement.settled_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(map_err)
    }
}
