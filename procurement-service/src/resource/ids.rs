//! Id specification parsing
//!
//! `?id=1`, `?id=1,2,3`, `?id[]=1&id[]=2` and `?id=1&id=2` all describe an id
//! set. Every occurrence is split on commas and the tokens are merged into
//! one list, deduplicated in first-occurrence order.

use super::error::{ResourceError, ResourceResult};

/// Normalize raw id parameter values into an ordered, deduplicated id list
///
/// Returns `Ok(None)` when no id parameter was supplied at all.
///
/// ```rust
/// use procurement_service::resource::parse_ids;
///
/// let ids = parse_ids(&["3,1", "3", "2"]).unwrap();
/// assert_eq!(ids, Some(vec![3, 1, 2]));
/// assert_eq!(parse_ids::<&str>(&[]).unwrap(), None);
/// assert!(parse_ids(&["1,x"]).is_err());
/// ```
pub fn parse_ids<S: AsRef<str>>(raw: &[S]) -> ResourceResult<Option<Vec<i64>>> {
    if raw.is_empty() {
        return Ok(None);
    }

    let mut ids: Vec<i64> = Vec::new();
    for value in raw {
        for token in value.as_ref().split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let id = parse_token(token)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }

    if ids.is_empty() {
        return Err(ResourceError::validation(
            "The id parameter must contain at least one ID.",
        ));
    }
    Ok(Some(ids))
}

fn parse_token(token: &str) -> ResourceResult<i64> {
    match token.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ResourceError::InvalidIdFormat {
            token: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_specifications() {
        let single_csv = parse_ids(&["1,2,3"]).unwrap();
        let repeated = parse_ids(&["1", "2", "3"]).unwrap();
        let mixed = parse_ids(&["1,2", "3"]).unwrap();
        assert_eq!(single_csv, Some(vec![1, 2, 3]));
        assert_eq!(single_csv, repeated);
        assert_eq!(repeated, mixed);
    }

    #[test]
    fn test_deduplicates_in_first_occurrence_order() {
        assert_eq!(parse_ids(&["5,2,5", "2,9"]).unwrap(), Some(vec![5, 2, 9]));
    }

    #[test]
    fn test_blank_tokens_are_ignored() {
        assert_eq!(parse_ids(&[" 4 , ,7,"]).unwrap(), Some(vec![4, 7]));
    }

    #[test]
    fn test_empty_parameter_is_validation_error() {
        assert!(matches!(
            parse_ids(&[""]),
            Err(ResourceError::Validation(_))
        ));
        assert!(matches!(
            parse_ids(&[" , "]),
            Err(ResourceError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_and_non_numeric() {
        for bad in ["0", "-3", "abc", "1.5", "99999999999999999999"] {
            match parse_ids(&[bad]) {
                Err(ResourceError::InvalidIdFormat { token }) => assert_eq!(token, bad),
                other => panic!("expected InvalidIdFormat for {bad}, got {other:?}"),
            }
        }
    }
}
