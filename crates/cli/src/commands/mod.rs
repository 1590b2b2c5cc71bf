pub mod generate;
pub mod history;
pub mod ingest;
pub mod init;
pub mod profiles;
pub mod status;
