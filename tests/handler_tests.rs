// tests/handler_tests.rs

use query_sieve::{Config, PopulateSpec, QueryDescriptor, QueryHandler, Value};

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// The configuration most of the original handler scenarios share.
fn populated_handler(spec: PopulateSpec) -> QueryHandler {
    QueryHandler::new(Config {
        allowed_fields: Some(fields(&["one", "two", "three", "user"])),
        default_fields: Some(fields(&["three"])),
        populate_fields: vec![("user".to_string(), spec)],
        ..Config::default()
    })
}

fn opts_fragment<'a>(descriptor: &'a QueryDescriptor, key: &str) -> &'a query_sieve::Fragment {
    descriptor
        .opts
        .get(key)
        .and_then(|v| v.as_fragment())
        .unwrap_or_else(|| panic!("expected fragment under '{}'", key))
}

#[test]
fn test_wildcard_handler_with_no_config() {
    let handler = QueryHandler::new(Config::default());

    let result = handler.handle_pairs(&[
        ("fields", Some("one,two")),
        ("per_page", Some("1")),
        ("page", Some("1")),
        ("toOptionsOne", Some("setMe")),
        ("toOptionsTwo", Some("setMeToo")),
    ]);

    assert_eq!(result.fields.as_deref(), Some("one two"));
    assert_eq!(result.page_sort.limit, 1);
    assert_eq!(result.page_sort.skip, 0);
    assert_eq!(result.opts.get("toOptionsOne"), Some(&Value::String("setMe".into())));
    assert_eq!(result.opts.get("toOptionsTwo"), Some(&Value::String("setMeToo".into())));
}

#[test]
fn test_disallowed_fields_dropped_from_opts() {
    let handler = QueryHandler::new(Config {
        allowed_fields: Some(fields(&["one"])),
        ..Config::default()
    });

    let result = handler.handle_pairs(&[
        ("fields", Some("one,two")),
        ("per_page", Some("1")),
        ("page", Some("1")),
        ("toOptionsOne", Some("setMe")),
        ("toOptionsTwo", Some("setMeToo")),
    ]);

    // projection is not validated unless asked for
    assert_eq!(result.fields.as_deref(), Some("one two"));
    assert!(!result.opts.contains_key("toOptionsOne"));
    assert!(!result.opts.contains_key("toOptionsTwo"));
}

#[test]
fn test_default_fields_used_when_none_requested() {
    let handler = QueryHandler::new(Config {
        allowed_fields: Some(fields(&["one", "two", "three"])),
        default_fields: Some(fields(&["three"])),
        ..Config::default()
    });

    let result = handler.handle_pairs(&[("per_page", Some("1")), ("page", Some("1"))]);
    assert_eq!(result.fields.as_deref(), Some("three"));
}

#[test]
fn test_validated_fields_filtered_against_allow_set() {
    let handler = QueryHandler::new(Config {
        allowed_fields: Some(fields(&["one"])),
        validate_returned_fields: true,
        ..Config::default()
    });

    let result = handler.handle_pairs(&[("fields", Some("one,two"))]);
    assert_eq!(result.fields.as_deref(), Some("one"));
}

#[test]
fn test_renamed_pagination_keys_and_allowed_defaults() {
    let handler = QueryHandler::new(Config {
        allowed_fields: Some(fields(&["one", "two", "toOptionsOne", "toOptionsTwo"])),
        validate_returned_fields: true,
        limit_name: "crazy".to_string(),
        offset_name: "crazier".to_string(),
        ..Config::default()
    });

    let result = handler.handle_pairs(&[
        ("crazy", Some("1")),
        ("crazier", Some("1")),
        ("toOptionsOne", Some("setMe")),
        ("toOptionsTwo", Some("setMeToo")),
    ]);

    assert_eq!(result.fields.as_deref(), Some("one two toOptionsOne toOptionsTwo"));
    assert_eq!(result.page_sort.limit, 1);
    assert_eq!(result.page_sort.skip, 0);
    assert!(result.opts.contains_key("toOptionsOne"));
    assert!(result.opts.contains_key("toOptionsTwo"));
}

// ============================================================================
// Population
// ============================================================================

#[test]
fn test_populate_uses_configured_defaults() {
    let handler = populated_handler(PopulateSpec {
        allowed_fields: Some(fields(&["first_name", "last_name"])),
        default_fields: Some(fields(&["first_name"])),
    });

    let result = handler.handle_pairs(&[("fields", Some("one,two")), ("user-populate", None)]);
    assert_eq!(result.fields.as_deref(), Some("one two"));
    assert_eq!(result.populated("user-populate"), Some("first_name"));
}

#[test]
fn test_populate_defaults_fall_back_to_rule_allowed() {
    let handler = populated_handler(PopulateSpec {
        allowed_fields: Some(fields(&["first_name", "last_name"])),
        default_fields: None,
    });

    let result = handler.handle_pairs(&[("user-populate", None)]);
    assert_eq!(result.populated("user-populate"), Some("first_name last_name"));
}

#[test]
fn test_populate_request_filtered_by_rule_allow_set() {
    let handler = populated_handler(PopulateSpec {
        allowed_fields: Some(fields(&["first_name", "last_name"])),
        default_fields: None,
    });

    let result = handler.handle_pairs(&[("user-populate", Some("first_name,full_name"))]);
    assert_eq!(result.populated("user-populate"), Some("first_name"));
}

#[test]
fn test_wildcard_populate_passes_everything() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[("user-populate", Some("getThis,andThis"))]);
    assert_eq!(result.populated("user-populate"), Some("getThis andThis"));
}

#[test]
fn test_unconfigured_populate_key_dropped() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[("ghost-populate", Some("a,b"))]);
    assert!(result.populated("ghost-populate").is_none());
    assert!(result.opts.is_empty());
}

// ============================================================================
// Filter interpretation
// ============================================================================

#[test]
fn test_query_operators_in_field_value() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[(
        "one",
        Some("hasprop,$exists,true,price,12,qty,2,location,$gte,5,name,thisname"),
    )]);

    let one = opts_fragment(&result, "one");
    let hasprop = one.get("hasprop").and_then(|v| v.as_fragment()).unwrap();
    assert_eq!(hasprop.get("$exists"), Some(&Value::Boolean(true)));
    assert_eq!(one.get("price"), Some(&Value::String("12".into())));
    assert_eq!(one.get("qty"), Some(&Value::String("2".into())));
    let location = one.get("location").and_then(|v| v.as_fragment()).unwrap();
    assert_eq!(location.get("$gte"), Some(&Value::String("5".into())));
    assert_eq!(one.get("name"), Some(&Value::String("thisname".into())));
}

#[test]
fn test_single_value_is_verbatim_literal() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[("one", Some("justthis"))]);
    assert_eq!(result.opts.get("one"), Some(&Value::String("justthis".into())));
}

#[test]
fn test_logical_or() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[("$or", Some("7,price,12,qty,2,location,$gte,5"))]);
    let elements = result.opts.get("$or").and_then(|v| v.as_list()).unwrap();

    assert_eq!(elements.len(), 3);
    assert_eq!(elements[0].get("price"), Some(&Value::String("12".into())));
    assert_eq!(elements[1].get("qty"), Some(&Value::String("2".into())));
    let location = elements[2].get("location").and_then(|v| v.as_fragment()).unwrap();
    assert_eq!(location.get("$gte"), Some(&Value::String("5".into())));
}

#[test]
fn test_logical_and_and_nor() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[("$and", Some("7,price,12,qty,2,location,$gte,5"))]);
    assert_eq!(result.opts.get("$and").and_then(|v| v.as_list()).map(<[_]>::len), Some(3));

    let result = handler.handle_pairs(&[("$nor", Some("4,price,12,qty,2"))]);
    assert_eq!(result.opts.get("$nor").and_then(|v| v.as_list()).map(<[_]>::len), Some(2));
}

#[test]
fn test_array_operator_value() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[("one", Some("$nin,4,1,2,3,4"))]);
    let one = opts_fragment(&result, "one");
    assert_eq!(one.get("$nin").and_then(|v| v.as_array()).map(<[_]>::len), Some(4));
}

#[test]
fn test_regex_operator_value() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[("one", Some("$regex,2,title,i"))]);
    let one = opts_fragment(&result, "one");
    let re = one.get("$regex").and_then(|v| v.as_regex()).unwrap();
    assert_eq!(re.as_str(), "(?i)title");
}

#[test]
fn test_or_with_repeated_fields() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[(
        "$or",
        Some("8,filtered_location,null,filtered_location,$size,0,filtered_location,$exists,false"),
    )]);

    let elements = result.opts.get("$or").and_then(|v| v.as_list()).unwrap();
    assert_eq!(elements.len(), 3);
    assert_eq!(elements[0].get("filtered_location"), Some(&Value::Null));
    let second = elements[1].get("filtered_location").and_then(|v| v.as_fragment()).unwrap();
    assert_eq!(second.get("$size"), Some(&Value::String("0".into())));
    let third = elements[2].get("filtered_location").and_then(|v| v.as_fragment()).unwrap();
    assert_eq!(third.get("$exists"), Some(&Value::Boolean(false)));
}

#[test]
fn test_complex_or_with_nested_expressions() {
    let handler = populated_handler(PopulateSpec::default());

    let result = handler.handle_pairs(&[(
        "$or",
        Some(
            "25,one,$regex,2,first,i,one,$regex,2,secondfirst,i,two,$regex,2,first,i,\
             two,$nin,4,1,2,3,4,three,$exists,true",
        ),
    )]);

    let elements = result.opts.get("$or").and_then(|v| v.as_list()).unwrap();
    assert_eq!(elements.len(), 5);

    let first = elements[0].get("one").and_then(|v| v.as_fragment()).unwrap();
    assert_eq!(first.get("$regex").and_then(|v| v.as_regex()).unwrap().as_str(), "(?i)first");
    let second = elements[1].get("one").and_then(|v| v.as_fragment()).unwrap();
    assert_eq!(
        second.get("$regex").and_then(|v| v.as_regex()).unwrap().as_str(),
        "(?i)secondfirst"
    );

    let fourth = elements[3].get("two").and_then(|v| v.as_fragment()).unwrap();
    let nin = fourth.get("$nin").and_then(|v| v.as_array()).unwrap();
    assert_eq!(nin.len(), 4);
    assert_eq!(nin[0], Value::String("1".into()));

    let fifth = elements[4].get("three").and_then(|v| v.as_fragment()).unwrap();
    assert_eq!(fifth.get("$exists"), Some(&Value::Boolean(true)));
}

#[test]
fn test_unknown_operator_key_never_surfaces() {
    let handler = QueryHandler::new(Config::default());

    let result = handler.handle_pairs(&[("one", Some("a,$__evil,b"))]);
    let one = opts_fragment(&result, "one");
    assert!(one.is_empty());
    assert!(!result.diagnostics.is_empty());
}

// ============================================================================
// Pagination and sort
// ============================================================================

#[test]
fn test_user_friendly_paging() {
    let handler = QueryHandler::new(Config::default());

    let result = handler.handle_pairs(&[("per_page", Some("1")), ("page", Some("1"))]);
    assert_eq!((result.page_sort.skip, result.page_sort.limit), (0, 1));

    let result = handler.handle_pairs(&[("per_page", Some("2")), ("page", Some("3"))]);
    assert_eq!((result.page_sort.skip, result.page_sort.limit), (4, 2));
}

#[test]
fn test_raw_offset_paging() {
    let handler = QueryHandler::new(Config {
        user_friendly_paging: false,
        ..Config::default()
    });

    let result = handler.handle_pairs(&[("per_page", Some("5")), ("page", Some("7"))]);
    assert_eq!((result.page_sort.skip, result.page_sort.limit), (7, 5));
}

#[test]
fn test_calculate_pagination() {
    let friendly = QueryHandler::new(Config::default());
    assert_eq!(friendly.calculate_pagination(1, 1), (0, 1));
    assert_eq!(friendly.calculate_pagination(2, 3), (4, 2));
    // page 0 does not underflow
    assert_eq!(friendly.calculate_pagination(10, 0), (0, 10));

    let raw = QueryHandler::new(Config {
        user_friendly_paging: false,
        ..Config::default()
    });
    assert_eq!(raw.calculate_pagination(5, 7), (7, 5));
}

#[test]
fn test_sort_pairs_in_request_order() {
    let handler = QueryHandler::new(Config::default());

    let result = handler.handle_pairs(&[("sort", Some("name,1,age,-1"))]);
    assert_eq!(
        result.page_sort.sort,
        vec![("name".to_string(), 1), ("age".to_string(), -1)]
    );
}

#[test]
fn test_sort_requires_a_direction() {
    let handler = QueryHandler::new(Config::default());

    let result = handler.handle_pairs(&[("sort", Some("name"))]);
    assert!(result.page_sort.sort.is_empty());
}

// ============================================================================
// Raw query strings
// ============================================================================

#[test]
fn test_raw_query_string() {
    let handler = QueryHandler::new(Config::default());

    let result = handler.handle_str("?fields=one%2Ctwo&page=2&per_page=10&name=mike");
    assert_eq!(result.fields.as_deref(), Some("one two"));
    assert_eq!((result.page_sort.skip, result.page_sort.limit), (10, 10));
    assert_eq!(result.opts.get("name"), Some(&Value::String("mike".into())));
}

#[test]
fn test_raw_query_string_value_less_key() {
    let handler = populated_handler(PopulateSpec {
        allowed_fields: Some(fields(&["first_name", "last_name"])),
        default_fields: Some(fields(&["first_name"])),
    });

    // a bare key has no usable literal for a filter, but still triggers
    // population defaults
    let result = handler.handle_str("user-populate&one");
    assert_eq!(result.populated("user-populate"), Some("first_name"));
    assert!(result.opts.is_empty());
}
