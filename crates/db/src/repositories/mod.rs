use thiserror::Error;

use clientele_core::domain::customer::CustomerField;
use clientele_core::store::StoreError;

pub mod customer;

pub use customer::SqlCustomerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        if let RepositoryError::Database(sqlx::Error::Database(ref db_error)) = error {
            if db_error.is_unique_violation() {
                return StoreError::UniqueViolation(unique_violation_fields(db_error.message()));
            }
        }
        StoreError::Backend(error.to_string())
    }
}

/// Maps SQLite's `UNIQUE constraint failed: customer.mobile_number` message
/// onto the fields it names.
fn unique_violation_fields(message: &str) -> Vec<CustomerField> {
    let columns = message.split_once(':').map(|(_, columns)| columns).unwrap_or(message);

    let mut fields: Vec<CustomerField> = columns
        .split(',')
        .filter_map(|column| match column.trim().rsplit('.').next() {
            Some("user_name") => Some(CustomerField::UserName),
            Some("email_address") => Some(CustomerField::EmailAddress),
            Some("mobile_number") => Some(CustomerField::MobileNumber),
            _ => None,
        })
        .collect();
    fields.sort();
    fields.dedup();
    fields
}
