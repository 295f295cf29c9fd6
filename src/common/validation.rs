//! Field rules shared by the reference-data models. Failures are returned as
//! `DbErr` so crudcrate hooks can propagate them with `?`.
use crate::common::errors::validation_db_err;
use sea_orm::DbErr;

/// Trims `name` and rejects it when empty
pub fn normalize_name(name: &str) -> Result<String, DbErr> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(validation_db_err("name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Codes are 1-10 characters of `A-Z`, `0-9` or `-`
pub fn validate_code(code: Option<&str>) -> Result<(), DbErr> {
    let Some(code) = code else {
        return Ok(());
    };
    let valid = (1..=10).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(validation_db_err(
            "code must be 1-10 characters of A-Z, 0-9 or '-'",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, true)]
    #[case(Some("MAP"), true)]
    #[case(Some("GZ-01"), true)]
    #[case(Some("ABCDEFGHIJ"), true)]
    #[case(Some(""), false)]
    #[case(Some("map"), false)]
    #[case(Some("ABCDEFGHIJK"), false)]
    #[case(Some("A B"), false)]
    fn test_validate_code(#[case] code: Option<&str>, #[case] valid: bool) {
        assert_eq!(validate_code(code).is_ok(), valid);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Maputo ").unwrap(), "Maputo");
        assert!(normalize_name("   ").is_err());
        assert!(normalize_name("").is_err());
    }
}
