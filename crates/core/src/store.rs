use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::customer::{Customer, CustomerField, CustomerFilter, CustomerId, NewCustomer};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated on {0:?}")]
    UniqueViolation(Vec<CustomerField>),
    #[error("customer `{0}` is not stored")]
    MissingRow(CustomerId),
    #[error("store failure: {0}")]
    Backend(String),
}

/// Persistence contract for customer records.
///
/// Implementations must enforce uniqueness of user name, mobile number and
/// email address on every write and report it as
/// [`StoreError::UniqueViolation`].
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError>;

    /// Overwrites the mutable columns of an existing row. The identifier and
    /// created timestamp are never written.
    async fn save(&self, customer: Customer) -> Result<Customer, StoreError>;

    async fn find_by_mobile_number(&self, mobile: &str) -> Result<Option<Customer>, StoreError>;
    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Customer>, StoreError>;
    async fn find_by_email_address(&self, email: &str) -> Result<Option<Customer>, StoreError>;

    async fn exists_by_user_name(&self, user_name: &str) -> Result<bool, StoreError>;
    async fn exists_by_email_address(&self, email: &str) -> Result<bool, StoreError>;
    async fn exists_by_mobile_number(&self, mobile: &str) -> Result<bool, StoreError>;

    async fn find_all(&self) -> Result<Vec<Customer>, StoreError>;
    async fn search(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, StoreError>;
}

#[derive(Default)]
struct InMemoryRows {
    next_id: i64,
    rows: BTreeMap<CustomerId, Customer>,
}

impl InMemoryRows {
    fn conflicts(
        &self,
        user_name: &str,
        email: &str,
        mobile: &str,
        except: Option<CustomerId>,
    ) -> Vec<CustomerField> {
        let mut fields = Vec::new();
        let others: Vec<&Customer> =
            self.rows.values().filter(|row| Some(row.id) != except).collect();

        if others.iter().any(|row| row.user_name == user_name) {
            fields.push(CustomerField::UserName);
        }
        if others.iter().any(|row| row.email_address == email) {
            fields.push(CustomerField::EmailAddress);
        }
        if others.iter().any(|row| row.mobile_number == mobile) {
            fields.push(CustomerField::MobileNumber);
        }
        fields
    }
}

/// Map-backed store. Uniqueness checks and writes share one write lock, so
/// concurrent inserts cannot both claim the same key.
#[derive(Default)]
pub struct InMemoryCustomerStore {
    inner: RwLock<InMemoryRows>,
}

impl InMemoryCustomerStore {
    async fn find_one(
        &self,
        predicate: impl Fn(&Customer) -> bool + Send,
    ) -> Result<Option<Customer>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().find(|row| predicate(row)).cloned())
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let mut inner = self.inner.write().await;
        let conflicts = inner.conflicts(
            &customer.user_name,
            &customer.email_address,
            &customer.mobile_number,
            None,
        );
        if !conflicts.is_empty() {
            return Err(StoreError::UniqueViolation(conflicts));
        }

        inner.next_id += 1;
        let stored = customer.with_id(CustomerId(inner.next_id));
        inner.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn save(&self, customer: Customer) -> Result<Customer, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.rows.get(&customer.id) else {
            return Err(StoreError::MissingRow(customer.id));
        };
        let created_at = existing.created_at;

        let conflicts = inner.conflicts(
            &customer.user_name,
            &customer.email_address,
            &customer.mobile_number,
            Some(customer.id),
        );
        if !conflicts.is_empty() {
            return Err(StoreError::UniqueViolation(conflicts));
        }

        let stored = Customer { created_at, ..customer };
        inner.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_mobile_number(&self, mobile: &str) -> Result<Option<Customer>, StoreError> {
        self.find_one(|row| row.mobile_number == mobile).await
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Customer>, StoreError> {
        self.find_one(|row| row.user_name == user_name).await
    }

    async fn find_by_email_address(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        self.find_one(|row| row.email_address == email).await
    }

    async fn exists_by_user_name(&self, user_name: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_user_name(user_name).await?.is_some())
    }

    async fn exists_by_email_address(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_email_address(email).await?.is_some())
    }

    async fn exists_by_mobile_number(&self, mobile: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_mobile_number(mobile).await?.is_some())
    }

    async fn find_all(&self) -> Result<Vec<Customer>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().cloned().collect())
    }

    async fn search(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().filter(|row| filter.matches(row)).cloned().collect())
    }
}
