pub mod email_service;
pub mod exchange_service;
