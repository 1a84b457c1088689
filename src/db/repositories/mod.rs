pub mod article;
pub mod permission;
pub mod user;

use chrono::{SecondsFormat, Utc};

/// Fixed-width UTC timestamp so that text ordering matches time ordering.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
