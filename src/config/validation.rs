use crate::error::{LedgerError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl std::fmt::Debug, reason: &str) -> LedgerError {
    LedgerError::Config(format!("{field} = {value:?}: {reason}"))
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "value cannot be empty or whitespace-only"));
    }
    Ok(())
}

/// A topic prefix must be a plain path: no wildcards, no empty levels at either end.
pub fn validate_topic_prefix(field: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field, value)?;
    if value.contains(['+', '#']) {
        return Err(invalid(field, value, "topic prefix cannot contain wildcards"));
    }
    if value.starts_with('/') || value.ends_with('/') {
        return Err(invalid(field, value, "topic prefix cannot start or end with '/'"));
    }
    Ok(())
}

/// Accepts MIFARE Classic 1K data blocks only: not the manufacturer block and
/// not a sector trailer.
pub fn validate_data_block(field: &str, block: u8) -> Result<()> {
    if block == 0 || block >= 64 {
        return Err(invalid(field, block, "block must be between 1 and 63"));
    }
    if block % 4 == 3 {
        return Err(invalid(field, block, "block is a sector trailer"));
    }
    Ok(())
}

pub fn validate_positive_number(field: &str, value: u32, min_value: u32) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field,
            value,
            &format!("value must be at least {min_value}"),
        ));
    }
    Ok(())
}
