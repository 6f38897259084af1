//! Filter conversion to Qdrant `Filter`.
//!
//! Category filtering is an exact keyword match on the `category` payload field.

use qdrant_client::qdrant::r#match::MatchValue;
use qdrant_client::qdrant::{Condition, FieldCondition, Filter, Match, condition::ConditionOneOf};
use tracing::debug;

use crate::record::CategoryFilter;

/// Payload key holding the category.
pub(crate) const CATEGORY_FIELD: &str = "category";

/// Converts [`CategoryFilter`] to a Qdrant [`Filter`] with a single `must` condition.
pub(crate) fn to_qdrant_filter(f: &CategoryFilter) -> Filter {
    debug!(category = %f.category, "filters::to_qdrant_filter");

    let cond = Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: CATEGORY_FIELD.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(f.category.clone())),
            }),
            ..Default::default()
        })),
    };

    Filter {
        must: vec![cond],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_single_must_keyword_condition() {
        let f = to_qdrant_filter(&CategoryFilter::new("cats"));
        assert!(f.should.is_empty());
        assert_eq!(f.must.len(), 1);
        match &f.must[0].condition_one_of {
            Some(ConditionOneOf::Field(fc)) => {
                assert_eq!(fc.key, "category");
                let m = fc.r#match.as_ref().and_then(|m| m.match_value.clone());
                assert_eq!(m, Some(MatchValue::Keyword("cats".into())));
            }
            other => panic!("unexpected condition: {other:?}"),
        }
    }
}
