pub mod clock;
pub mod config;
pub mod credential;
pub mod domain;
pub mod errors;
pub mod mapper;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::{
    Argon2CredentialIssuer, CredentialError, CredentialIssuer, StaticCredentialIssuer,
};
pub use domain::customer::{
    AgeComparison, Customer, CustomerField, CustomerFilter, CustomerId, CustomerInput,
    CustomerStatus, CustomerView, NewCustomer,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use service::CustomerService;
pub use store::{CustomerStore, InMemoryCustomerStore, StoreError};
