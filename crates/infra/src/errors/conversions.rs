//! Conversions from external infrastructure errors into domain errors.

use cadence_domain::CadenceError;
use keyring::Error as KeyringError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CadenceError);

impl From<InfraError> for CadenceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CadenceError> for InfraError {
    fn from(value: CadenceError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCadenceError {
    fn into_cadence(self) -> CadenceError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl IntoCadenceError for SqlError {
    fn into_cadence(self) -> CadenceError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        fn looks_like_wrong_key(message: &str) -> bool {
            let lower = message.to_ascii_lowercase();
            lower.contains("not a database") || lower.contains("encrypted")
        }

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        CadenceError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        CadenceError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        CadenceError::Database("unique constraint violation".into())
                    }
                    (_, _) if looks_like_wrong_key(&message) => CadenceError::Database(
                        "SQLCipher key rejected or database not encrypted".into(),
                    ),
                    _ => CadenceError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => CadenceError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                CadenceError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                CadenceError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => CadenceError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => CadenceError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_cadence())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(CadenceError::Database(format!("connection pool: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl IntoCadenceError for KeyringError {
    fn into_cadence(self) -> CadenceError {
        use KeyringError::{BadEncoding, NoEntry, NoStorageAccess, PlatformFailure};

        match self {
            NoEntry => CadenceError::NotFound("keychain entry not found".into()),
            BadEncoding(_) => {
                CadenceError::Internal("credential in keychain is not valid UTF-8".into())
            }
            PlatformFailure(err) => CadenceError::Internal(format!("keychain platform error: {err}")),
            NoStorageAccess(err) => {
                CadenceError::Internal(format!("unable to access secure storage: {err}"))
            }
            other => CadenceError::Internal(format!("keychain error: {other}")),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_cadence())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl IntoCadenceError for HttpError {
    fn into_cadence(self) -> CadenceError {
        if self.is_timeout() {
            return CadenceError::NetworkUnavailable("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CadenceError::NetworkUnavailable("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_to_error(status, None);
        }

        if self.is_decode() {
            return CadenceError::rejected(format!("malformed response body: {self}"));
        }

        CadenceError::NetworkUnavailable(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_cadence())
    }
}

/// Classify a non-success HTTP status. `reason` is the server-provided error
/// text, when there is one.
pub fn status_to_error(status: reqwest::StatusCode, reason: Option<String>) -> CadenceError {
    let code = status.as_u16();
    let message = reason.filter(|r| !r.trim().is_empty()).unwrap_or_else(|| {
        format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"))
    });

    match code {
        401 | 403 => CadenceError::Unauthorized,
        408 | 429 | 500..=599 => CadenceError::NetworkUnavailable(message),
        _ => CadenceError::RemoteRejected { reason: message },
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
