//! Conversions between API input, stored records, and the outbound view.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::domain::customer::{Customer, CustomerInput, CustomerStatus, CustomerView, NewCustomer};

/// Builds a fresh ACTIVE record. Created and updated timestamps are both `now`.
pub fn to_record(input: CustomerInput, credential: SecretString, now: DateTime<Utc>) -> NewCustomer {
    NewCustomer {
        user_name: input.user_name.trim().to_string(),
        first_name: input.first_name,
        last_name: input.last_name,
        age: input.customer_age,
        mobile_number: input.customer_mobile_number.trim().to_string(),
        email_address: input.customer_email_address.trim().to_string(),
        address: input.customer_address,
        status: CustomerStatus::Active,
        credential_hash: credential,
        start_date: input.start_date,
        created_at: now,
        updated_at: now,
    }
}

/// Projects every field except the credential.
pub fn to_view(customer: &Customer) -> CustomerView {
    CustomerView {
        customer_id: customer.id,
        user_name: customer.user_name.clone(),
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        customer_age: customer.age,
        customer_email_address: customer.email_address.clone(),
        customer_mobile_number: customer.mobile_number.clone(),
        customer_address: customer.address.clone(),
        user_status: customer.status,
        start_date: customer.start_date,
        created_date: customer.created_at,
        updated_date: customer.updated_at,
    }
}
