//! CLI subcommands.

pub mod migrate;
pub mod shipments;

use secrecy::SecretString;

/// Read the shipment database URL the same way the server does.
///
/// `SHIPDESK_DATABASE_URL` wins over `DATABASE_URL`.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    ["SHIPDESK_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok().filter(|value| !value.is_empty()))
        .map(SecretString::from)
}
