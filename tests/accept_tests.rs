use endpoints::accept::{AcceptHeader, Specificity};

#[test]
fn test_rfc_example_ordering() {
    let accept = AcceptHeader::parse(
        "text/*;q=0.3, text/html;q=0.7, text/html;level=1, text/html;level=2;q=0.4, */*;q=0.5",
    );
    let order: Vec<&str> = accept.iter().map(|m| m.raw()).collect();
    assert_eq!(
        order,
        [
            "text/html;level=1",
            "text/html;q=0.7",
            "*/*;q=0.5",
            "text/html;level=2;q=0.4",
            "text/*;q=0.3",
        ]
    );
    assert_eq!(accept.first().map(|m| m.specificity()), Some(Specificity::Exact));
}

#[test]
fn test_wildcard_filter_with_version() {
    let accept = AcceptHeader::parse("*/*;version=v5");
    assert_eq!(
        accept
            .filter("application/json", &[("version", "v5")])
            .count(),
        1
    );
    assert_eq!(
        accept
            .filter("application/json", &[("version", "v6")])
            .count(),
        0
    );
    assert_eq!(accept.version("application/json"), Some("v5"));
}

#[test]
fn test_subtype_wildcard_on_either_side() {
    let accept = AcceptHeader::parse("application/*;version=v1, text/html");
    assert_eq!(accept.filter("application/json", &[]).count(), 1);
    assert_eq!(accept.filter("text/*", &[]).count(), 1);
    assert_eq!(accept.filter("image/png", &[]).count(), 0);
}

#[test]
fn test_version_ignores_other_types() {
    let accept = AcceptHeader::parse("text/html;version=v1, application/json;version=v3");
    assert_eq!(accept.version("application/json"), Some("v3"));
    assert_eq!(accept.version("*/*"), Some("v1"));
    assert_eq!(accept.version("image/png"), None);
}
