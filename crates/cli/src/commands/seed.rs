use std::sync::Arc;

use chrono::NaiveDate;
use clientele_core::{
    ApplicationError, Argon2CredentialIssuer, CustomerInput, CustomerService, DomainError,
    SystemClock,
};
use clientele_db::SqlCustomerRepository;

use crate::commands::{with_migrated_pool, CommandResult};

#[derive(Debug, Default)]
struct SeedReport {
    created: Vec<String>,
    skipped: Vec<String>,
}

impl SeedReport {
    fn message(&self) -> String {
        format!(
            "seeded {} demo customers, {} already present",
            self.created.len(),
            self.skipped.len()
        )
    }
}

pub fn run() -> CommandResult {
    let outcome = with_migrated_pool("seed", |pool| async move {
        let service = CustomerService::new(
            Arc::new(SqlCustomerRepository::new(pool)),
            Arc::new(SystemClock),
            Arc::new(Argon2CredentialIssuer),
        );

        let mut report = SeedReport::default();
        for input in demo_customers() {
            let user_name = input.user_name.clone();
            match service.create(input).await {
                Ok(_) => report.created.push(user_name),
                Err(ApplicationError::Domain(DomainError::DuplicateField { .. })) => {
                    report.skipped.push(user_name)
                }
                Err(error) => {
                    return Err(("seed_execution", format!("{user_name}: {error}"), 6u8));
                }
            }
        }
        Ok(report)
    });

    match outcome {
        Ok(report) => CommandResult::success("seed", report.message()),
        Err(failure) => failure,
    }
}

fn demo_customers() -> Vec<CustomerInput> {
    vec![
        CustomerInput {
            user_name: "Aiyan".to_string(),
            first_name: Some("Aiyan".to_string()),
            last_name: Some("Khan".to_string()),
            customer_age: 2,
            customer_mobile_number: "0987654321".to_string(),
            customer_email_address: "Aiyan@x.com".to_string(),
            customer_address: "town".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15),
        },
        CustomerInput {
            user_name: "Aakif".to_string(),
            first_name: Some("Aakif".to_string()),
            last_name: Some("Khan".to_string()),
            customer_age: 31,
            customer_mobile_number: "0000000002".to_string(),
            customer_email_address: "aakif@x.com".to_string(),
            customer_address: "city".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1),
        },
        CustomerInput {
            user_name: "zara.m".to_string(),
            first_name: Some("Zara".to_string()),
            last_name: Some("Mirza".to_string()),
            customer_age: 45,
            customer_mobile_number: "0000000003".to_string(),
            customer_email_address: "zara.m@x.com".to_string(),
            customer_address: "harbour road".to_string(),
            start_date: None,
        },
    ]
}
