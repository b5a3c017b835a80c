pub mod initdb;
pub mod receive_payment;
pub mod seed_coa;

pub use initdb::init_database;
pub use receive_payment::receive_payment;
pub use seed_coa::seed_chart_of_accounts;
