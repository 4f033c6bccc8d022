//! Customer lifecycle: create, lookup, update, soft-delete, patch and search.
//!
//! Every mutation stamps `updated_at` from the injected [`Clock`]. Uniqueness
//! is pre-checked so that a single failure can name every conflicting field,
//! but the store's unique constraints stay authoritative: a violation reported
//! at write time is surfaced as the same `DuplicateField` failure.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::credential::CredentialIssuer;
use crate::domain::customer::{
    validate_mobile_number, AgeComparison, Customer, CustomerField, CustomerFilter, CustomerInput,
    CustomerStatus, CustomerView,
};
use crate::errors::{ApplicationError, DomainError};
use crate::mapper;
use crate::store::{CustomerStore, StoreError};

impl From<StoreError> for ApplicationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation(fields) => DomainError::duplicate(fields).into(),
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn CustomerStore>,
    clock: Arc<dyn Clock>,
    credentials: Arc<dyn CredentialIssuer>,
}

impl CustomerService {
    pub fn new(
        store: Arc<dyn CustomerStore>,
        clock: Arc<dyn Clock>,
        credentials: Arc<dyn CredentialIssuer>,
    ) -> Self {
        Self { store, clock, credentials }
    }

    pub async fn create(&self, input: CustomerInput) -> Result<CustomerView, ApplicationError> {
        input.validate()?;

        let mut duplicates = Vec::new();
        if self.store.exists_by_user_name(input.user_name.trim()).await? {
            duplicates.push(CustomerField::UserName);
        }
        if self.store.exists_by_email_address(input.customer_email_address.trim()).await? {
            duplicates.push(CustomerField::EmailAddress);
        }
        if self.store.exists_by_mobile_number(input.customer_mobile_number.trim()).await? {
            duplicates.push(CustomerField::MobileNumber);
        }
        if !duplicates.is_empty() {
            warn!(
                event_name = "customer.create.duplicate",
                user_name = %input.user_name,
                fields = ?duplicates,
                "customer create rejected"
            );
            return Err(DomainError::duplicate(duplicates).into());
        }

        let credential = self
            .credentials
            .issue()
            .map_err(|error| ApplicationError::Configuration(error.to_string()))?;
        let record = mapper::to_record(input, credential, self.clock.now());
        let stored = self.store.insert(record).await?;

        info!(
            event_name = "customer.created",
            customer_id = %stored.id,
            user_name = %stored.user_name,
            "customer created"
        );
        Ok(mapper::to_view(&stored))
    }

    pub async fn get_all(&self) -> Result<Vec<CustomerView>, ApplicationError> {
        let customers = self.store.find_all().await?;
        Ok(customers.iter().map(mapper::to_view).collect())
    }

    pub async fn get_by_mobile_number(&self, mobile: &str) -> Result<CustomerView, ApplicationError> {
        let customer = self.require_by_mobile(mobile).await?;
        Ok(mapper::to_view(&customer))
    }

    pub async fn get_by_user_name(&self, user_name: &str) -> Result<CustomerView, ApplicationError> {
        let customer = self.require_by_user_name(user_name).await?;
        Ok(mapper::to_view(&customer))
    }

    pub async fn get_by_email_address(&self, email: &str) -> Result<CustomerView, ApplicationError> {
        let customer = self
            .store
            .find_by_email_address(email)
            .await?
            .ok_or_else(|| DomainError::not_found(email))?;
        Ok(mapper::to_view(&customer))
    }

    /// Overwrites the profile fields of the customer owning the input's mobile
    /// number. Mobile number, status and identifier are left as stored.
    pub async fn update(&self, input: CustomerInput) -> Result<CustomerView, ApplicationError> {
        input.validate()?;
        let mut customer = self.require_by_mobile(input.customer_mobile_number.trim()).await?;

        customer.user_name = input.user_name.trim().to_string();
        customer.first_name = input.first_name;
        customer.last_name = input.last_name;
        customer.age = input.customer_age;
        customer.address = input.customer_address;
        customer.email_address = input.customer_email_address.trim().to_string();
        customer.start_date = input.start_date;

        self.persist(customer, "customer.updated").await
    }

    pub async fn soft_delete(&self, mobile: &str) -> Result<CustomerView, ApplicationError> {
        let mut customer = self.require_by_mobile(mobile).await?;
        customer.status = CustomerStatus::Inactive;
        self.persist(customer, "customer.soft_deleted").await
    }

    /// Any existing owner of `new_mobile` blocks the patch, including the
    /// customer being patched.
    pub async fn patch_mobile_number(
        &self,
        user_name: &str,
        new_mobile: &str,
    ) -> Result<CustomerView, ApplicationError> {
        validate_mobile_number(new_mobile)?;
        let new_mobile = new_mobile.trim();
        let mut customer = self.require_by_user_name(user_name).await?;

        if self.store.exists_by_mobile_number(new_mobile).await? {
            warn!(
                event_name = "customer.mobile_patch.duplicate",
                user_name = %user_name,
                mobile_number = %new_mobile,
                "mobile number already in use"
            );
            return Err(DomainError::duplicate(vec![CustomerField::MobileNumber]).into());
        }

        customer.mobile_number = new_mobile.to_string();
        self.persist(customer, "customer.mobile_patched").await
    }

    pub async fn patch_status(
        &self,
        mobile: &str,
        status: CustomerStatus,
    ) -> Result<CustomerView, ApplicationError> {
        let mut customer = self.require_by_mobile(mobile).await?;
        customer.status = status;
        self.persist(customer, "customer.status_patched").await
    }

    pub async fn search_by_first_name(
        &self,
        first_name: &str,
    ) -> Result<Vec<CustomerView>, ApplicationError> {
        self.search(CustomerFilter::FirstName(first_name.to_string())).await
    }

    pub async fn search_by_first_and_last_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<CustomerView>, ApplicationError> {
        self.search(CustomerFilter::FirstAndLastName {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
        .await
    }

    pub async fn search_by_first_or_last_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<CustomerView>, ApplicationError> {
        self.search(CustomerFilter::FirstOrLastName {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
        .await
    }

    pub async fn search_distinct_by_first_and_last_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<CustomerView>, ApplicationError> {
        self.search(CustomerFilter::DistinctFirstAndLastName {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
        .await
    }

    pub async fn search_by_age(
        &self,
        comparison: AgeComparison,
        age: i32,
    ) -> Result<Vec<CustomerView>, ApplicationError> {
        self.search(CustomerFilter::Age { comparison, age }).await
    }

    pub async fn search_by_start_date_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CustomerView>, ApplicationError> {
        if start > end {
            return Err(DomainError::Validation(format!(
                "start date {start} must not be after end date {end}"
            ))
            .into());
        }
        self.search(CustomerFilter::StartDateBetween { start, end }).await
    }

    async fn search(&self, filter: CustomerFilter) -> Result<Vec<CustomerView>, ApplicationError> {
        let customers = self.store.search(&filter).await?;
        Ok(customers.iter().map(mapper::to_view).collect())
    }

    async fn require_by_mobile(&self, mobile: &str) -> Result<Customer, ApplicationError> {
        self.store
            .find_by_mobile_number(mobile)
            .await?
            .ok_or_else(|| DomainError::not_found(mobile).into())
    }

    async fn require_by_user_name(&self, user_name: &str) -> Result<Customer, ApplicationError> {
        self.store
            .find_by_user_name(user_name)
            .await?
            .ok_or_else(|| DomainError::not_found(user_name).into())
    }

    async fn persist(
        &self,
        mut customer: Customer,
        event_name: &'static str,
    ) -> Result<CustomerView, ApplicationError> {
        customer.updated_at = self.clock.now();
        let saved = self.store.save(customer).await?;

        info!(
            event_name,
            customer_id = %saved.id,
            mobile_number = %saved.mobile_number,
            status = %saved.status,
            "customer record saved"
        );
        Ok(mapper::to_view(&saved))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::CustomerService;
    use crate::clock::ManualClock;
    use crate::credential::StaticCredentialIssuer;
    use crate::domain::customer::{AgeComparison, CustomerField, CustomerInput, CustomerStatus};
    use crate::errors::{ApplicationError, DomainError};
    use crate::store::{CustomerStore, InMemoryCustomerStore};

    fn fixture() -> (CustomerService, ManualClock, Arc<InMemoryCustomerStore>) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap());
        let store = Arc::new(InMemoryCustomerStore::default());
        let service = CustomerService::new(
            store.clone(),
            Arc::new(clock.clone()),
            Arc::new(StaticCredentialIssuer::default()),
        );
        (service, clock, store)
    }

    fn aiyan() -> CustomerInput {
        CustomerInput {
            user_name: "Aiyan".to_string(),
            customer_age: 2,
            customer_mobile_number: "0987654321".to_string(),
            customer_email_address: "Aiyan@x.com".to_string(),
            customer_address: "town".to_string(),
            ..CustomerInput::default()
        }
    }

    fn person(user: &str, mobile: &str, first: &str, last: &str, age: i32) -> CustomerInput {
        CustomerInput {
            user_name: user.to_string(),
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            customer_age: age,
            customer_mobile_number: mobile.to_string(),
            customer_email_address: format!("{user}@x.com"),
            customer_address: "street".to_string(),
            start_date: None,
        }
    }

    fn duplicate_fields(error: ApplicationError) -> Vec<CustomerField> {
        match error {
            ApplicationError::Domain(DomainError::DuplicateField { fields }) => fields,
            other => panic!("expected duplicate field error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_returns_active_view_with_equal_timestamps() {
        let (service, _, _) = fixture();

        let view = service.create(aiyan()).await.expect("create");

        assert_eq!(view.user_status, CustomerStatus::Active);
        assert_eq!(view.created_date, view.updated_date);
        assert_eq!(view.user_name, "Aiyan");
        assert!(view.customer_id.0 > 0);
    }

    #[tokio::test]
    async fn create_with_same_mobile_names_mobile_number() {
        let (service, _, _) = fixture();
        service.create(aiyan()).await.expect("first create");

        let second = CustomerInput {
            user_name: "Other".to_string(),
            customer_email_address: "other@x.com".to_string(),
            ..aiyan()
        };
        let error = service.create(second).await.expect_err("duplicate mobile");

        assert_eq!(duplicate_fields(error), vec![CustomerField::MobileNumber]);
    }

    #[tokio::test]
    async fn create_reports_all_duplicate_fields_in_one_message() {
        let (service, _, _) = fixture();
        service.create(aiyan()).await.expect("first create");

        let error = service.create(aiyan()).await.expect_err("all duplicate");

        assert_eq!(
            error.to_string(),
            "Duplicate fields: userName, emailAddress, mobileNumber _ customer already exists"
        );
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_before_touching_store() {
        let (service, _, store) = fixture();
        let invalid = CustomerInput { customer_email_address: "nope".to_string(), ..aiyan() };

        let error = service.create(invalid).await.expect_err("invalid email");

        assert!(matches!(error, ApplicationError::Domain(DomainError::Validation(_))));
        assert!(store.find_all().await.expect("all").is_empty());
    }

    #[tokio::test]
    async fn get_by_unknown_mobile_is_not_found() {
        let (service, _, _) = fixture();

        let error = service.get_by_mobile_number("1111111111").await.expect_err("missing");

        assert_eq!(error, ApplicationError::Domain(DomainError::not_found("1111111111")));
    }

    #[tokio::test]
    async fn lookups_by_user_name_and_email_find_the_record() {
        let (service, _, _) = fixture();
        let created = service.create(aiyan()).await.expect("create");

        let by_name = service.get_by_user_name("Aiyan").await.expect("by name");
        let by_email = service.get_by_email_address("Aiyan@x.com").await.expect("by email");

        assert_eq!(by_name, created);
        assert_eq!(by_email, created);
        assert_eq!(service.get_all().await.expect("all"), vec![created]);
    }

    #[tokio::test]
    async fn update_keeps_mobile_id_and_status() {
        let (service, clock, _) = fixture();
        let created = service.create(aiyan()).await.expect("create");
        service.patch_status("0987654321", CustomerStatus::Inactive).await.expect("deactivate");
        clock.advance(Duration::minutes(5));

        let updated = service
            .update(CustomerInput {
                first_name: Some("Aiyan".to_string()),
                last_name: Some("Khan".to_string()),
                customer_age: 3,
                customer_address: "city".to_string(),
                customer_email_address: "aiyan.khan@x.com".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 1, 10),
                ..aiyan()
            })
            .await
            .expect("update");

        assert_eq!(updated.customer_id, created.customer_id);
        assert_eq!(updated.customer_mobile_number, "0987654321");
        assert_eq!(updated.user_status, CustomerStatus::Inactive);
        assert_eq!(updated.customer_age, 3);
        assert_eq!(updated.customer_email_address, "aiyan.khan@x.com");
        assert_eq!(updated.created_date, created.created_date);
        assert!(updated.updated_date > updated.created_date);
    }

    #[tokio::test]
    async fn update_unknown_mobile_is_not_found() {
        let (service, _, _) = fixture();

        let error = service.update(aiyan()).await.expect_err("missing");

        assert!(matches!(error, ApplicationError::Domain(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn update_into_another_customers_email_is_duplicate() {
        let (service, _, _) = fixture();
        service.create(aiyan()).await.expect("create aiyan");
        service.create(person("Aakif", "0000000002", "Aakif", "Khan", 30)).await.expect("aakif");

        let error = service
            .update(CustomerInput { customer_email_address: "Aakif@x.com".to_string(), ..aiyan() })
            .await
            .expect_err("email taken");

        assert_eq!(duplicate_fields(error), vec![CustomerField::EmailAddress]);
    }

    #[tokio::test]
    async fn soft_delete_twice_stays_inactive_and_advances_timestamp() {
        let (service, clock, _) = fixture();
        service.create(aiyan()).await.expect("create");

        clock.advance(Duration::seconds(1));
        let first = service.soft_delete("0987654321").await.expect("first delete");
        clock.advance(Duration::seconds(1));
        let second = service.soft_delete("0987654321").await.expect("second delete");

        assert_eq!(first.user_status, CustomerStatus::Inactive);
        assert_eq!(second.user_status, CustomerStatus::Inactive);
        assert!(second.updated_date > first.updated_date);

        let still_there = service.get_by_mobile_number("0987654321").await.expect("queryable");
        assert_eq!(still_there.user_status, CustomerStatus::Inactive);
    }

    #[tokio::test]
    async fn patch_mobile_moves_number_and_advances_timestamp() {
        let (service, clock, _) = fixture();
        let created =
            service.create(person("Aakif", "0000000002", "Aakif", "Khan", 30)).await.expect("create");
        clock.advance(Duration::minutes(1));

        let patched = service.patch_mobile_number("Aakif", "0000000001").await.expect("patch");

        assert_eq!(patched.customer_mobile_number, "0000000001");
        assert!(patched.updated_date > created.updated_date);
        assert_eq!(patched.user_status, created.user_status);
        assert_eq!(patched.created_date, created.created_date);
        assert!(service.get_by_mobile_number("0000000002").await.is_err());
    }

    #[tokio::test]
    async fn patch_mobile_to_used_number_is_duplicate() {
        let (service, _, _) = fixture();
        service.create(aiyan()).await.expect("create aiyan");
        service.create(person("Aakif", "0000000002", "Aakif", "Khan", 30)).await.expect("aakif");

        let taken = service.patch_mobile_number("Aakif", "0987654321").await.expect_err("taken");
        assert_eq!(duplicate_fields(taken), vec![CustomerField::MobileNumber]);

        let own = service.patch_mobile_number("Aakif", "0000000002").await.expect_err("own");
        assert_eq!(duplicate_fields(own), vec![CustomerField::MobileNumber]);
    }

    #[tokio::test]
    async fn patch_mobile_for_unknown_user_is_not_found() {
        let (service, _, _) = fixture();

        let error = service.patch_mobile_number("ghost", "0000000001").await.expect_err("missing");

        assert_eq!(error, ApplicationError::Domain(DomainError::not_found("ghost")));
    }

    #[tokio::test]
    async fn patch_status_transitions_both_ways() {
        let (service, clock, _) = fixture();
        service.create(aiyan()).await.expect("create");

        clock.advance(Duration::seconds(1));
        let inactive =
            service.patch_status("0987654321", CustomerStatus::Inactive).await.expect("off");
        clock.advance(Duration::seconds(1));
        let active = service.patch_status("0987654321", CustomerStatus::Active).await.expect("on");

        assert_eq!(inactive.user_status, CustomerStatus::Inactive);
        assert_eq!(active.user_status, CustomerStatus::Active);
        assert!(active.updated_date > inactive.updated_date);
    }

    #[tokio::test]
    async fn name_searches_return_empty_vec_when_nothing_matches() {
        let (service, _, _) = fixture();
        service.create(person("ada", "1", "Ada", "Lovelace", 36)).await.expect("ada");
        service.create(person("ada2", "2", "Ada", "Byron", 20)).await.expect("ada2");
        service.create(person("alan", "3", "Alan", "Turing", 41)).await.expect("alan");

        assert_eq!(service.search_by_first_name("Ada").await.expect("first").len(), 2);
        assert_eq!(
            service.search_by_first_and_last_name("Ada", "Byron").await.expect("and").len(),
            1
        );
        assert_eq!(
            service.search_by_first_or_last_name("Alan", "Byron").await.expect("or").len(),
            2
        );
        assert_eq!(
            service
                .search_distinct_by_first_and_last_name("Ada", "Lovelace")
                .await
                .expect("distinct")
                .len(),
            1
        );
        assert!(service.search_by_first_name("Grace").await.expect("none").is_empty());
    }

    #[tokio::test]
    async fn age_and_date_searches_filter_records() {
        let (service, _, _) = fixture();
        let mut young = person("young", "1", "Y", "Y", 18);
        young.start_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        let mut old = person("old", "2", "O", "O", 65);
        old.start_date = NaiveDate::from_ymd_opt(2025, 12, 31);
        service.create(young).await.expect("young");
        service.create(old).await.expect("old");

        let under = service.search_by_age(AgeComparison::LessThanOrEqual, 18).await.expect("le");
        assert_eq!(under.len(), 1);
        let over = service.search_by_age(AgeComparison::GreaterThan, 18).await.expect("gt");
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].user_name, "old");

        let in_range = service
            .search_by_start_date_between(
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            )
            .await
            .expect("range");
        assert_eq!(in_range.len(), 2);
    }

    #[tokio::test]
    async fn reversed_date_range_is_rejected() {
        let (service, _, _) = fixture();

        let error = service
            .search_by_start_date_between(
                NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            )
            .await
            .expect_err("reversed range");

        assert!(matches!(error, ApplicationError::Domain(DomainError::Validation(_))));
    }
}
