pub mod demo;
pub mod response;
pub mod survey;
pub mod user;

use crate::error::Error;

/// The caller identity resolved by the session layer, if any.
pub fn authenticated(caller: Option<i32>) -> Result<i32, Error> {
    caller.ok_or(Error::Unauthenticated)
}

/// Trimmed value, `None` when absent or blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn check_len(value: &str, field: &'static str, max: usize) -> Result<(), Error> {
    if value.chars().count() > max {
        return Err(Error::TooLong(field, max));
    }
    Ok(())
}
