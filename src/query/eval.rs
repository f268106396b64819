//! Filter and ordering semantics of a managed document database, shared by
//! in-process stores.

use std::cmp::Ordering;

use super::{Direction, Filter, Operator, OrderBy};
use crate::value::{Document, Timestamp, Value};

/// Resolve a dotted field path inside a document body.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let value = match path.split_once('.') {
        Some((head, rest)) => document.get(head)?.get_path(rest)?,
        None => document.get(path)?,
    };
    (!value.is_absent()).then_some(value)
}

// Cross-type order: null < boolean < number < timestamp < string < bytes <
// reference < array < map.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Absent | Value::Null => 0,
        Value::Boolean(_) => 1,
        Value::Integer(_) | Value::Double(_) => 2,
        Value::Date(_) | Value::Timestamp(_) => 3,
        Value::String(_) => 4,
        Value::Bytes(_) => 5,
        Value::Reference(_) => 6,
        Value::Array(_) => 7,
        Value::Map(_) => 8,
        Value::Sentinel(_) => 9,
    }
}

fn as_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::Date(date) => Some(Timestamp::from(*date)),
        Value::Timestamp(ts) => Some(*ts),
        _ => None,
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    if let (Value::Integer(a), Value::Integer(b)) = (a, b) {
        return a.cmp(b);
    }
    let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Total order over values, first by type class, then within the class.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
        (Value::Reference(a), Value::Reference(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b.iter())
            .map(|(a, b)| compare_values(a, b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Map(a), Value::Map(b)) => a
            .iter()
            .zip(b.iter())
            .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| compare_values(va, vb)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        _ if type_rank(a) == 2 => compare_numbers(a, b),
        _ if type_rank(a) == 3 => as_timestamp(a).cmp(&as_timestamp(b)),
        _ => Ordering::Equal,
    }
}

fn same_class(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    same_class(a, b) && compare_values(a, b) == Ordering::Equal
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    haystack
        .as_array()
        .map(|items| items.iter().any(|item| values_equal(item, needle)))
        .unwrap_or(false)
}

/// Whether `document` satisfies `filter`. Documents lacking the field never match.
pub(super) fn matches(filter: &Filter, document: &Document) -> bool {
    let Some(field) = lookup(document, &filter.field) else {
        return false;
    };
    let value = &filter.value;

    match filter.op {
        Operator::Eq => values_equal(field, value),
        Operator::NotEq => !field.is_null() && !values_equal(field, value),
        Operator::Lt => same_class(field, value) && compare_values(field, value).is_lt(),
        Operator::Lte => same_class(field, value) && compare_values(field, value).is_le(),
        Operator::Gt => same_class(field, value) && compare_values(field, value).is_gt(),
        Operator::Gte => same_class(field, value) && compare_values(field, value).is_ge(),
        Operator::ArrayContains => contains(field, value),
        Operator::ArrayContainsAny => value
            .as_array()
            .map(|wanted| wanted.iter().any(|item| contains(field, item)))
            .unwrap_or(false),
        Operator::In => contains(value, field),
        Operator::NotIn => !field.is_null() && value.as_array().is_some() && !contains(value, field),
    }
}

/// Sort `(id, body)` pairs by `order_by`, dropping documents that lack the
/// ordered field. Ties, and the unordered case, fall back to document id.
pub fn sort_documents(documents: &mut Vec<(String, Document)>, order_by: Option<&OrderBy>) {
    let Some(order_by) = order_by else {
        documents.sort_by(|(a, _), (b, _)| a.cmp(b));
        return;
    };

    documents.retain(|(_, body)| lookup(body, &order_by.field).is_some());
    documents.sort_by(|(id_a, a), (id_b, b)| {
        let ordering = match (lookup(a, &order_by.field), lookup(b, &order_by.field)) {
            (Some(a), Some(b)) => compare_values(a, b),
            _ => Ordering::Equal,
        }
        .then_with(|| id_a.cmp(id_b));

        match order_by.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(entries: &[(&str, Value)]) -> Document {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn missing_fields_never_match() {
        let body = doc(&[("name", Value::from("Ana"))]);
        assert!(!matches(&Filter::new("age", Operator::NotEq, 3), &body));
        assert!(!matches(&Filter::new("age", Operator::NotIn, vec![3]), &body));
    }

    #[test]
    fn ranges_only_match_the_same_type_class() {
        let body = doc(&[("age", Value::from("20"))]);
        assert!(!matches(&Filter::new("age", Operator::Gte, 18), &body));

        let body = doc(&[("age", Value::Integer(20))]);
        assert!(matches(&Filter::new("age", Operator::Gte, 18.5), &body));
        assert!(matches(&Filter::new("age", Operator::Eq, 20.0), &body));
    }

    #[test]
    fn array_operators() {
        let body = doc(&[("tags", Value::from(vec!["a", "b"])), ("level", Value::from(2))]);

        assert!(matches(&Filter::new("tags", Operator::ArrayContains, "b"), &body));
        assert!(matches(
            &Filter::new("tags", Operator::ArrayContainsAny, vec!["x", "a"]),
            &body
        ));
        assert!(matches(&Filter::new("level", Operator::In, vec![1, 2]), &body));
        assert!(!matches(&Filter::new("level", Operator::NotIn, vec![1, 2]), &body));
    }

    #[test]
    fn nested_paths_are_resolved() {
        let body = doc(&[(
            "address",
            Value::Map(doc(&[("city", Value::from("Recife"))])),
        )]);
        assert!(matches(&Filter::equals("address.city", "Recife"), &body));
    }

    #[test]
    fn dates_compare_with_stored_timestamps() {
        let now = chrono::Utc::now();
        let body = doc(&[("at", Value::Timestamp(Timestamp::from(now)))]);
        assert!(matches(&Filter::equals("at", now), &body));
    }

    #[test]
    fn sorting_drops_missing_fields_and_breaks_ties_by_id() {
        let mut documents = vec![
            ("c".to_string(), doc(&[("age", Value::from(30))])),
            ("b".to_string(), doc(&[("age", Value::from(20))])),
            ("a".to_string(), doc(&[("age", Value::from(30))])),
            ("d".to_string(), doc(&[])),
        ];

        sort_documents(&mut documents, Some(&OrderBy::desc("age")));
        let ids: Vec<&str> = documents.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn cross_type_order() {
        let ordered = [
            Value::Null,
            Value::Boolean(true),
            Value::Integer(1),
            Value::Timestamp(Timestamp::new(0, 0)),
            Value::from("a"),
            Value::Array(vec![]),
            Value::Map(Document::new()),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(compare_values(&pair[0], &pair[1]), Ordering::Less);
        }
    }
}
