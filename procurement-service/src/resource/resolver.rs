//! Request parameter resolution
//!
//! Turns raw query-string pairs into the typed inputs the engine works with:
//! id sets, exact-match query objects, search filters and page requests.

use serde_json::Value;

use super::descriptor::ResourceDescriptor;
use super::error::{ResourceError, ResourceResult};
use super::ids::parse_ids;
use super::pagination::{Mode, PageRequest};
use crate::repository::{Filter, FilterCondition, FilterValue};

/// Query-string values relevant to a resource request, still unparsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    /// Every value given for `id`, `id[]` or one of the descriptor's aliases
    pub id: Vec<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub mode: Option<String>,
    pub search: Option<String>,
    pub query: Option<String>,
}

impl RawParams {
    /// Collect the parameters from decoded query pairs
    ///
    /// Repeated keys accumulate for ids; for the other keys the last
    /// occurrence wins.
    ///
    /// ```rust
    /// use procurement_service::catalog;
    /// use procurement_service::resource::RawParams;
    ///
    /// let pairs = vec![
    ///     ("purchase_type_id".to_string(), "4".to_string()),
    ///     ("id[]".to_string(), "5".to_string()),
    /// ];
    /// let params = RawParams::from_pairs(&pairs, &catalog::purchase_types());
    /// assert_eq!(params.id, vec!["4", "5"]);
    /// ```
    pub fn from_pairs(pairs: &[(String, String)], descriptor: &ResourceDescriptor) -> Self {
        let id_keys = descriptor.id_keys();
        let mut params = Self::default();
        for (key, value) in pairs {
            let base = key.strip_suffix("[]").unwrap_or(key);
            if id_keys.iter().any(|k| *k == base) {
                params.id.push(value.clone());
                continue;
            }
            let slot = match key.as_str() {
                "page" => &mut params.page,
                "per_page" => &mut params.per_page,
                "mode" => &mut params.mode,
                "search" => &mut params.search,
                "query" => &mut params.query,
                _ => continue,
            };
            *slot = Some(value.clone());
        }
        params
    }
}

/// Case-insensitive substring search over the searchable fields
///
/// Blank terms and descriptors without searchable fields produce no filter.
pub fn search_filter(term: Option<&str>, descriptor: &ResourceDescriptor) -> Option<Filter> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    if descriptor.searchable.is_empty() {
        return None;
    }
    Some(Filter::any_of(
        descriptor
            .searchable
            .iter()
            .map(|field| FilterCondition::contains(*field, term))
            .collect(),
    ))
}

/// Parse a `query` parameter into exact-match filters
///
/// ```rust
/// use procurement_service::catalog;
/// use procurement_service::resource::parse_query_object;
///
/// let filters = parse_query_object(r#"{"code":"PC"}"#, &catalog::item_units()).unwrap();
/// assert_eq!(filters.len(), 1);
/// assert!(parse_query_object(r#"{"colour":"red"}"#, &catalog::item_units()).is_err());
/// ```
pub fn parse_query_object(raw: &str, descriptor: &ResourceDescriptor) -> ResourceResult<Vec<Filter>> {
    let value: Value = serde_json::from_str(raw).map_err(|_| {
        ResourceError::validation("The query parameter must be a valid JSON object.")
    })?;
    let Value::Object(map) = value else {
        return Err(ResourceError::validation(
            "The query parameter must be a valid JSON object.",
        ));
    };
    if map.is_empty() {
        return Err(ResourceError::validation(
            "The query parameter must contain at least one field.",
        ));
    }

    let mut filters = Vec::with_capacity(map.len());
    for (field, value) in &map {
        if field != "id" && descriptor.field_spec(field).is_none() {
            return Err(ResourceError::validation(format!(
                "Unknown field '{}' in query.",
                field
            )));
        }
        let value = FilterValue::from_json(value).ok_or_else(|| {
            ResourceError::validation(format!(
                "Query field '{}' must be a scalar value.",
                field
            ))
        })?;
        filters.push(Filter::from(FilterCondition::eq(field.as_str(), value)));
    }
    Ok(filters)
}

/// Validated inputs of a read request
#[derive(Debug, Clone, PartialEq)]
pub struct ReadParams {
    pub ids: Option<Vec<i64>>,
    pub mode: Mode,
    pub page: PageRequest,
    pub search: Option<String>,
}

impl ReadParams {
    pub fn parse(raw: &RawParams, default_per_page: u64) -> ResourceResult<Self> {
        let ids = parse_ids(&raw.id)?;
        let mode = Mode::parse(raw.mode.as_deref())?;
        let page = PageRequest::parse(raw.page.as_deref(), raw.per_page.as_deref(), default_per_page)?;
        let search = raw
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(Self {
            ids,
            mode,
            page,
            search,
        })
    }
}

/// What a delete request addresses
#[derive(Debug, Clone, PartialEq)]
pub enum MutationTarget {
    /// Explicit ids; unknown ones are skipped
    Ids(Vec<i64>),
    /// Exact-match query that must resolve to a single record
    Query(Vec<Filter>),
}

impl MutationTarget {
    /// Exactly one of `id` or `query` must be supplied
    pub fn parse(raw: &RawParams, descriptor: &ResourceDescriptor) -> ResourceResult<Self> {
        let query = raw.query.as_deref().filter(|q| !q.trim().is_empty());
        match (raw.id.is_empty(), query) {
            (false, Some(_)) => Err(ResourceError::validation(
                "Provide either 'id' or 'query', not both.",
            )),
            (true, None) => Err(ResourceError::validation(
                "Either 'id' or 'query' parameter is required.",
            )),
            (false, None) => {
                let ids = parse_ids(&raw.id)?.unwrap_or_default();
                Ok(Self::Ids(ids))
            }
            (true, Some(query)) => Ok(Self::Query(parse_query_object(query, descriptor)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_pairs_collects_every_id_form() {
        let params = RawParams::from_pairs(
            &pairs(&[("id", "1,2"), ("id[]", "3"), ("id", "4"), ("search", "box"), ("other", "x")]),
            &catalog::item_units(),
        );
        assert_eq!(params.id, vec!["1,2", "3", "4"]);
        assert_eq!(params.search.as_deref(), Some("box"));
    }

    #[test]
    fn test_alias_not_accepted_for_other_resources() {
        let params = RawParams::from_pairs(&pairs(&[("purchase_type_id", "4")]), &catalog::item_units());
        assert!(params.id.is_empty());
    }

    #[test]
    fn test_search_filter() {
        let units = catalog::item_units();
        assert!(search_filter(None, &units).is_none());
        assert!(search_filter(Some("   "), &units).is_none());
        match search_filter(Some(" pie "), &units) {
            Some(Filter::AnyOf(conditions)) => {
                assert_eq!(conditions.len(), units.searchable.len());
                assert!(conditions.iter().all(|c| c.value == FilterValue::from("pie")));
            }
            other => panic!("unexpected filter {other:?}"),
        }
    }

    #[test]
    fn test_query_object_validation() {
        let units = catalog::item_units();
        for bad in ["not json", "[1,2]", "{}", r#"{"code":["PC"]}"#, r#"{"code":{"a":1}}"#] {
            assert!(
                matches!(parse_query_object(bad, &units), Err(ResourceError::Validation(_))),
                "{bad} should be rejected"
            );
        }
        let filters = parse_query_object(r#"{"id":3,"name":"Piece"}"#, &units).unwrap();
        assert_eq!(filters.len(), 2);
    }

    #[test]
    fn test_read_params_defaults() {
        let params = ReadParams::parse(&RawParams::default(), 10).unwrap();
        assert_eq!(params.ids, None);
        assert_eq!(params.mode, Mode::Pagination);
        assert_eq!(params.page, PageRequest { page: 1, per_page: 10 });
        assert_eq!(params.search, None);
    }

    #[test]
    fn test_mutation_target_requires_exactly_one() {
        let units = catalog::item_units();
        let both = RawParams {
            id: vec!["1".to_string()],
            query: Some(r#"{"code":"PC"}"#.to_string()),
            ..RawParams::default()
        };
        assert!(MutationTarget::parse(&both, &units).is_err());
        assert!(MutationTarget::parse(&RawParams::default(), &units).is_err());

        let ids = RawParams {
            id: vec!["2,1,2".to_string()],
            ..RawParams::default()
        };
        assert_eq!(MutationTarget::parse(&ids, &units).unwrap(), MutationTarget::Ids(vec![2, 1]));

        let query = RawParams {
            query: Some(r#"{"code":"PC"}"#.to_string()),
            ..RawParams::default()
        };
        assert!(matches!(
            MutationTarget::parse(&query, &units).unwrap(),
            MutationTarget::Query(filters) if filters.len() == 1
        ));
    }
}
