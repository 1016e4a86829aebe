//! Batch import of user records
//!
//! A payload that is a JSON array of objects is read as [`UserRecord`]s.
//! Anything else is read as delimited text with one user per line, where rows
//! may be wrapped in brackets and quotes. A payload that cannot be read at all
//! is malformed and imports nothing. Inside a readable payload every record
//! succeeds or fails on its own.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    models::{NewUser, Role, UserRecord},
    password::{PasswordHasher, hash_blocking},
    repositories::UserRepository,
};

/// Number of positional fields in a delimited row
pub const DELIMITED_FIELD_COUNT: usize = 13;

/// Failure count reported when the payload itself is unreadable
pub const MALFORMED_SENTINEL: i64 = -1;

/// Outcome of a batch import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total_count: i64,
    pub imported_count: i64,
    pub failed_count: i64,
}

impl BatchReport {
    /// Report for a payload that could not be parsed
    pub fn malformed() -> Self {
        Self {
            total_count: 0,
            imported_count: 0,
            failed_count: MALFORMED_SENTINEL,
        }
    }
}

/// A parsed row, or the reason it could not be parsed
type Candidate = Result<UserRecord, String>;

/// Parses bulk payloads and inserts each record independently
#[derive(Clone)]
pub struct BatchImporter {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl BatchImporter {
    /// Create a new batch importer
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
        }
    }

    /// Import every record of the payload.
    ///
    /// Returns [`ApiError::MalformedPayload`] when the payload cannot be
    /// parsed; in that case nothing is written.
    pub async fn import_batch(&self, payload: &[u8]) -> ApiResult<BatchReport> {
        let candidates = parse_payload(payload)?;
        info!("Importing batch of {} record(s)", candidates.len());

        let mut report = BatchReport {
            total_count: candidates.len() as i64,
            imported_count: 0,
            failed_count: 0,
        };

        for (index, candidate) in candidates.into_iter().enumerate() {
            match self.import_record(candidate).await {
                Ok(()) => report.imported_count += 1,
                Err(reason) => {
                    warn!("Record {} not imported: {}", index + 1, reason);
                    report.failed_count += 1;
                }
            }
        }

        info!(
            "Batch import finished: {} imported, {} failed",
            report.imported_count, report.failed_count
        );
        Ok(report)
    }

    async fn import_record(&self, candidate: Candidate) -> Result<(), String> {
        let record = candidate?;

        if record.username.trim().is_empty() {
            return Err("username is required".to_string());
        }
        if record.password.is_empty() {
            return Err(format!("password is required for {}", record.username));
        }

        match self.user_repository.exists_by_username(&record.username).await {
            Ok(true) => return Err(format!("username {} already exists", record.username)),
            Ok(false) => {}
            Err(e) => {
                error!("Existence check failed for {}: {}", record.username, e);
                return Err(e.to_string());
            }
        }

        let password_hash = hash_blocking(self.password_hasher.clone(), record.password.clone())
            .await
            .map_err(|e| e.to_string())?;
        let username = record.username.clone();

        match self
            .user_repository
            .save(&NewUser::from_record(record, password_hash))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_conflict() => Err(format!("username {} already exists", username)),
            Err(e) => {
                error!("Failed to save {}: {}", username, e);
                Err(e.to_string())
            }
        }
    }
}

fn parse_payload(payload: &[u8]) -> ApiResult<Vec<Candidate>> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| ApiError::MalformedPayload(format!("payload is not UTF-8: {}", e)))?;
    let trimmed = text.trim_start();

    if trimmed.is_empty() {
        return Err(ApiError::MalformedPayload("payload is empty".to_string()));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) if items.iter().all(Value::is_object) => {
            Ok(items.into_iter().map(parse_element).collect())
        }
        Ok(Value::Object(_)) => Err(ApiError::MalformedPayload(
            "JSON payload must be an array of records".to_string(),
        )),
        Err(e) if looks_structured(trimmed) => Err(ApiError::MalformedPayload(format!(
            "invalid JSON payload: {}",
            e
        ))),
        Ok(_) | Err(_) => Ok(parse_delimited(text)),
    }
}

/// A payload opening with `{` or `[{` was meant as a JSON array of records
fn looks_structured(trimmed: &str) -> bool {
    match trimmed.strip_prefix('[') {
        Some(rest) => rest.trim_start().starts_with('{'),
        None => trimmed.starts_with('{'),
    }
}

fn parse_element(item: Value) -> Candidate {
    serde_json::from_value(item).map_err(|e| format!("invalid record: {}", e))
}

fn parse_delimited(text: &str) -> Vec<Candidate> {
    let mut rows = text
        .lines()
        .map(strip_row)
        .filter(|row| !row.trim().is_empty())
        .map(|row| {
            row.split(',')
                .map(|field| field.trim().to_string())
                .collect::<Vec<_>>()
        })
        .peekable();

    if rows.next_if(|fields| is_header(fields)).is_some() {
        info!("Skipping header row");
    }

    rows.map(|fields| parse_row(&fields)).collect()
}

fn strip_row(line: &str) -> String {
    line.chars()
        .filter(|c| !matches!(c, '[' | ']' | '"'))
        .collect()
}

fn is_header(fields: &[String]) -> bool {
    fields.len() == DELIMITED_FIELD_COUNT
        && fields[9].eq_ignore_ascii_case("username")
        && fields[11].eq_ignore_ascii_case("password")
}

fn parse_row(fields: &[String]) -> Candidate {
    if fields.len() != DELIMITED_FIELD_COUNT {
        return Err(format!(
            "expected {} fields, found {}",
            DELIMITED_FIELD_COUNT,
            fields.len()
        ));
    }

    let optional = |value: &String| (!value.is_empty()).then(|| value.clone());

    let birth_date = if fields[2].is_empty() {
        None
    } else {
        Some(
            NaiveDate::parse_from_str(&fields[2], "%Y-%m-%d")
                .map_err(|e| format!("invalid birth date {}: {}", fields[2], e))?,
        )
    };
    let role = fields[12].parse::<Role>()?;

    Ok(UserRecord {
        first_name: optional(&fields[0]),
        last_name: optional(&fields[1]),
        birth_date,
        city: optional(&fields[3]),
        country: optional(&fields[4]),
        avatar: optional(&fields[5]),
        company: optional(&fields[6]),
        job_position: optional(&fields[7]),
        mobile: optional(&fields[8]),
        username: fields[9].clone(),
        email: optional(&fields[10]),
        password: fields[11].clone(),
        role,
    })
}
