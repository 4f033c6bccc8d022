use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

const MAX_CUSTOMER_AGE: i32 = 150;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustomerStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(DomainError::Validation(format!(
                "unsupported customer status `{other}` (expected ACTIVE|INACTIVE)"
            ))),
        }
    }
}

/// Fields that carry a uniqueness guarantee across all customers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CustomerField {
    #[serde(rename = "userName")]
    UserName,
    #[serde(rename = "emailAddress")]
    EmailAddress,
    #[serde(rename = "mobileNumber")]
    MobileNumber,
}

impl CustomerField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserName => "userName",
            Self::EmailAddress => "emailAddress",
            Self::MobileNumber => "mobileNumber",
        }
    }
}

impl fmt::Display for CustomerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored customer record.
///
/// `credential_hash` is write-only: it is never projected into a
/// [`CustomerView`] and `SecretString` keeps it out of `Debug` output.
#[derive(Clone, Debug)]
pub struct Customer {
    pub id: CustomerId,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: i32,
    pub mobile_number: String,
    pub email_address: String,
    pub address: String,
    pub status: CustomerStatus,
    pub credential_hash: SecretString,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A customer record that has not been assigned an identifier yet.
#[derive(Clone, Debug)]
pub struct NewCustomer {
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: i32,
    pub mobile_number: String,
    pub email_address: String,
    pub address: String,
    pub status: CustomerStatus,
    pub credential_hash: SecretString,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewCustomer {
    pub fn with_id(self, id: CustomerId) -> Customer {
        Customer {
            id,
            user_name: self.user_name,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            mobile_number: self.mobile_number,
            email_address: self.email_address,
            address: self.address,
            status: self.status,
            credential_hash: self.credential_hash,
            start_date: self.start_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Client-supplied customer data for create and update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub user_name: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub customer_age: i32,
    pub customer_mobile_number: String,
    pub customer_email_address: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

impl CustomerInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.user_name.trim().is_empty() {
            return Err(DomainError::Validation("userName must not be blank".to_string()));
        }
        validate_mobile_number(&self.customer_mobile_number)?;

        let email = self.customer_email_address.trim();
        if email.is_empty() {
            return Err(DomainError::Validation(
                "customerEmailAddress must not be blank".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(DomainError::Validation(format!(
                "customerEmailAddress `{email}` is not a valid email address"
            )));
        }

        if !(0..=MAX_CUSTOMER_AGE).contains(&self.customer_age) {
            return Err(DomainError::Validation(format!(
                "customerAge must be in range 0..={MAX_CUSTOMER_AGE}"
            )));
        }

        Ok(())
    }
}

pub fn validate_mobile_number(mobile_number: &str) -> Result<(), DomainError> {
    if mobile_number.trim().is_empty() {
        return Err(DomainError::Validation("customerMobileNumber must not be blank".to_string()));
    }
    Ok(())
}

/// Externally visible projection of a [`Customer`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub customer_id: CustomerId,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub customer_age: i32,
    pub customer_email_address: String,
    pub customer_mobile_number: String,
    pub customer_address: String,
    pub user_status: CustomerStatus,
    pub start_date: Option<NaiveDate>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeComparison {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl AgeComparison {
    pub fn matches(self, age: i32, bound: i32) -> bool {
        match self {
            Self::LessThan => age < bound,
            Self::LessThanOrEqual => age <= bound,
            Self::GreaterThan => age > bound,
            Self::GreaterThanOrEqual => age >= bound,
        }
    }

    pub fn sql_operator(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
        }
    }
}

/// Predicate lookups over non-unique customer fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomerFilter {
    FirstName(String),
    FirstAndLastName { first_name: String, last_name: String },
    FirstOrLastName { first_name: String, last_name: String },
    /// Rows are distinct per customer, and each row is one customer, so this
    /// matches the same rows as `FirstAndLastName`.
    DistinctFirstAndLastName { first_name: String, last_name: String },
    Age { comparison: AgeComparison, age: i32 },
    StartDateBetween { start: NaiveDate, end: NaiveDate },
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        let first = customer.first_name.as_deref();
        let last = customer.last_name.as_deref();
        match self {
            Self::FirstName(first_name) => first == Some(first_name.as_str()),
            Self::FirstAndLastName { first_name, last_name }
            | Self::DistinctFirstAndLastName { first_name, last_name } => {
                first == Some(first_name.as_str()) && last == Some(last_name.as_str())
            }
            Self::FirstOrLastName { first_name, last_name } => {
                first == Some(first_name.as_str()) || last == Some(last_name.as_str())
            }
            Self::Age { comparison, age } => comparison.matches(customer.age, *age),
            Self::StartDateBetween { start, end } => customer
                .start_date
                .map(|date| *start <= date && date <= *end)
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{
        AgeComparison, Customer, CustomerFilter, CustomerId, CustomerInput, CustomerStatus,
    };
    use crate::errors::DomainError;

    fn input() -> CustomerInput {
        CustomerInput {
            user_name: "Aiyan".to_string(),
            customer_age: 2,
            customer_mobile_number: "0987654321".to_string(),
            customer_email_address: "Aiyan@x.com".to_string(),
            customer_address: "town".to_string(),
            ..CustomerInput::default()
        }
    }

    fn customer(first: Option<&str>, last: Option<&str>, age: i32) -> Customer {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Customer {
            id: CustomerId(1),
            user_name: "user".to_string(),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            age,
            mobile_number: "1".to_string(),
            email_address: "u@x.com".to_string(),
            address: String::new(),
            status: CustomerStatus::Active,
            credential_hash: "hash".to_string().into(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 15),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("inactive".parse::<CustomerStatus>(), Ok(CustomerStatus::Inactive));
        assert_eq!(" ACTIVE ".parse::<CustomerStatus>(), Ok(CustomerStatus::Active));
        assert!(matches!("DELETED".parse::<CustomerStatus>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn input_deserializes_from_wire_names() {
        let input: CustomerInput = serde_json::from_str(
            r#"{"userName":"Aiyan","customerAge":2,"customerMobileNumber":"0987654321",
                "customerEmailAddress":"Aiyan@x.com","customerAddress":"town","startDate":"2025-03-01"}"#,
        )
        .expect("input should deserialize");

        assert_eq!(input.user_name, "Aiyan");
        assert_eq!(input.first_name, None);
        assert_eq!(input.start_date, NaiveDate::from_ymd_opt(2025, 3, 1));
    }

    #[test]
    fn validation_rejects_blank_keys_and_bad_email() {
        assert!(input().validate().is_ok());

        let blank_user = CustomerInput { user_name: "  ".to_string(), ..input() };
        assert!(matches!(blank_user.validate(), Err(DomainError::Validation(ref m)) if m.contains("userName")));

        let bad_email =
            CustomerInput { customer_email_address: "not-an-email".to_string(), ..input() };
        assert!(bad_email.validate().is_err());

        let negative_age = CustomerInput { customer_age: -1, ..input() };
        assert!(negative_age.validate().is_err());
    }

    #[test]
    fn age_comparisons_are_strict_or_inclusive() {
        assert!(AgeComparison::LessThan.matches(29, 30));
        assert!(!AgeComparison::LessThan.matches(30, 30));
        assert!(AgeComparison::LessThanOrEqual.matches(30, 30));
        assert!(!AgeComparison::GreaterThan.matches(30, 30));
        assert!(AgeComparison::GreaterThanOrEqual.matches(30, 30));
    }

    #[test]
    fn name_filters_distinguish_and_from_or() {
        let ada = customer(Some("Ada"), Some("Lovelace"), 36);
        let and = CustomerFilter::FirstAndLastName {
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
        };
        let or = CustomerFilter::FirstOrLastName {
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
        };

        assert!(!and.matches(&ada));
        assert!(or.matches(&ada));
        assert!(CustomerFilter::FirstName("Ada".to_string()).matches(&ada));
    }

    #[test]
    fn start_date_range_is_inclusive_and_skips_missing_dates() {
        let mut record = customer(None, None, 20);
        let filter = CustomerFilter::StartDateBetween {
            start: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        };
        assert!(filter.matches(&record));

        record.start_date = None;
        assert!(!filter.matches(&record));
    }
}
