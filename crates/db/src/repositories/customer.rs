use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::ExposeSecret;
use sqlx::{QueryBuilder, Row, Sqlite};

use clientele_core::domain::customer::{
    Customer, CustomerFilter, CustomerId, CustomerStatus, NewCustomer,
};
use clientele_core::store::{CustomerStore, StoreError};

use super::RepositoryError;
use crate::DbPool;

const CUSTOMER_COLUMNS: &str = "id, user_name, first_name, last_name, age, mobile_number,
    email_address, address, status, credential_hash, start_date, created_at, updated_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_customer).transpose()
    }

    async fn find_by_column(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE {column} = ?"))
                .bind(value)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(row_to_customer).transpose()
    }

    async fn exists_by_column(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<bool, RepositoryError> {
        let found: i64 = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM customer WHERE {column} = ?)"
        ))
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }

    async fn insert_row(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO customer (user_name, first_name, last_name, age, mobile_number,
                                   email_address, address, status, credential_hash,
                                   start_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&customer.user_name)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.age)
        .bind(&customer.mobile_number)
        .bind(&customer.email_address)
        .bind(&customer.address)
        .bind(customer.status.as_str())
        .bind(customer.credential_hash.expose_secret())
        .bind(customer.start_date.map(format_date))
        .bind(customer.created_at.to_rfc3339())
        .bind(customer.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(customer.with_id(CustomerId(result.last_insert_rowid())))
    }

    async fn update_row(&self, customer: &Customer) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer SET
                 user_name = ?,
                 first_name = ?,
                 last_name = ?,
                 age = ?,
                 mobile_number = ?,
                 email_address = ?,
                 address = ?,
                 status = ?,
                 start_date = ?,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(&customer.user_name)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.age)
        .bind(&customer.mobile_number)
        .bind(&customer.email_address)
        .bind(&customer.address)
        .bind(customer.status.as_str())
        .bind(customer.start_date.map(format_date))
        .bind(customer.updated_at.to_rfc3339())
        .bind(customer.id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn search_rows(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, RepositoryError> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        query_builder.push(CUSTOMER_COLUMNS);
        query_builder.push(" FROM customer WHERE ");

        match filter {
            CustomerFilter::FirstName(first_name) => {
                query_builder.push("first_name = ");
                query_builder.push_bind(first_name.clone());
            }
            CustomerFilter::FirstAndLastName { first_name, last_name }
            | CustomerFilter::DistinctFirstAndLastName { first_name, last_name } => {
                query_builder.push("first_name = ");
                query_builder.push_bind(first_name.clone());
                query_builder.push(" AND last_name = ");
                query_builder.push_bind(last_name.clone());
            }
            CustomerFilter::FirstOrLastName { first_name, last_name } => {
                query_builder.push("(first_name = ");
                query_builder.push_bind(first_name.clone());
                query_builder.push(" OR last_name = ");
                query_builder.push_bind(last_name.clone());
                query_builder.push(")");
            }
            CustomerFilter::Age { comparison, age } => {
                query_builder.push("age ");
                query_builder.push(comparison.sql_operator());
                query_builder.push(" ");
                query_builder.push_bind(*age);
            }
            CustomerFilter::StartDateBetween { start, end } => {
                query_builder.push("start_date BETWEEN ");
                query_builder.push_bind(format_date(*start));
                query_builder.push(" AND ");
                query_builder.push_bind(format_date(*end));
            }
        }
        query_builder.push(" ORDER BY id");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_customer).collect()
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column} `{value}`: {e}")))
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_name: String =
        row.try_get("user_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let first_name: Option<String> =
        row.try_get("first_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let last_name: Option<String> =
        row.try_get("last_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let age: i32 = row.try_get("age").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let mobile_number: String =
        row.try_get("mobile_number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email_address: String =
        row.try_get("email_address").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let address: String =
        row.try_get("address").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let credential_hash: String =
        row.try_get("credential_hash").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let start_date_str: Option<String> =
        row.try_get("start_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = status_str
        .parse::<CustomerStatus>()
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let start_date = start_date_str
        .map(|value| {
            NaiveDate::parse_from_str(&value, DATE_FORMAT)
                .map_err(|e| RepositoryError::Decode(format!("start_date `{value}`: {e}")))
        })
        .transpose()?;

    Ok(Customer {
        id: CustomerId(id),
        user_name,
        first_name,
        last_name,
        age,
        mobile_number,
        email_address,
        address,
        status,
        credential_hash: credential_hash.into(),
        start_date,
        created_at: parse_timestamp("created_at", &created_at_str)?,
        updated_at: parse_timestamp("updated_at", &updated_at_str)?,
    })
}

#[async_trait]
impl CustomerStore for SqlCustomerRepository {
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        Ok(self.insert_row(customer).await?)
    }

    async fn save(&self, customer: Customer) -> Result<Customer, StoreError> {
        let id = customer.id;
        if self.update_row(&customer).await? == 0 {
            return Err(StoreError::MissingRow(id));
        }

        self.find_by_id(id).await?.ok_or(StoreError::MissingRow(id))
    }

    async fn find_by_mobile_number(&self, mobile: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.find_by_column("mobile_number", mobile).await?)
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.find_by_column("user_name", user_name).await?)
    }

    async fn find_by_email_address(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.find_by_column("email_address", email).await?)
    }

    async fn exists_by_user_name(&self, user_name: &str) -> Result<bool, StoreError> {
        Ok(self.exists_by_column("user_name", user_name).await?)
    }

    async fn exists_by_email_address(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.exists_by_column("email_address", email).await?)
    }

    async fn exists_by_mobile_number(&self, mobile: &str) -> Result<bool, StoreError> {
        Ok(self.exists_by_column("mobile_number", mobile).await?)
    }

    async fn find_all(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customer ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        Ok(rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()?)
    }

    async fn search(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, StoreError> {
        Ok(self.search_rows(filter).await?)
    }
}
