use super::{RouteLookup, Router};
use crate::registry::{RouteError, RouteTemplate};
use http::Method;

fn router(routes: &[(Method, &'static str)]) -> Router<&'static str> {
    let mut router = Router::new();
    for (method, path) in routes {
        router
            .insert(method.clone(), &RouteTemplate::parse(path).unwrap(), *path)
            .unwrap();
    }
    router
}

fn matched(lookup: RouteLookup<'_, &'static str>) -> (&'static str, Vec<(String, String)>) {
    match lookup {
        RouteLookup::Match { payload, params } => (
            *payload,
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ),
        other => panic!("expected a match, got {other:?}"),
    }
}

#[test]
fn test_root_path() {
    let router = router(&[(Method::GET, "/")]);
    let (payload, params) = matched(router.lookup(&Method::GET, "/"));
    assert_eq!(payload, "/");
    assert!(params.is_empty());
}

#[test]
fn test_parameterized_path() {
    let router = router(&[(Method::GET, "/items/{id}")]);
    let (_, params) = matched(router.lookup(&Method::GET, "/items/123"));
    assert_eq!(params, vec![("id".to_string(), "123".to_string())]);
}

#[test]
fn test_multiple_parameters_in_order() {
    let router = router(&[(Method::GET, "/users/{user_id}/posts/{post_id}")]);
    let (_, params) = matched(router.lookup(&Method::GET, "/users/1/posts/2"));
    assert_eq!(
        params,
        vec![
            ("user_id".to_string(), "1".to_string()),
            ("post_id".to_string(), "2".to_string())
        ]
    );
}

#[test]
fn test_parameter_values_are_percent_decoded() {
    let router = router(&[(Method::GET, "/files/{name}")]);
    let (_, params) = matched(router.lookup(&Method::GET, "/files/my%20report"));
    assert_eq!(params[0].1, "my report");
}

#[test]
fn test_static_segment_wins_over_parameter() {
    let router = router(&[(Method::GET, "/users/{id}"), (Method::GET, "/users/me")]);
    assert_eq!(matched(router.lookup(&Method::GET, "/users/me")).0, "/users/me");
    assert_eq!(matched(router.lookup(&Method::GET, "/users/7")).0, "/users/{id}");
}

#[test]
fn test_backtracks_from_static_branch() {
    let router = router(&[
        (Method::GET, "/users/me/settings"),
        (Method::GET, "/users/{id}/posts"),
    ]);
    let (payload, params) = matched(router.lookup(&Method::GET, "/users/me/posts"));
    assert_eq!(payload, "/users/{id}/posts");
    assert_eq!(params, vec![("id".to_string(), "me".to_string())]);
}

#[test]
fn test_different_param_names_same_position() {
    let router = router(&[
        (Method::GET, "/users/{user_id}/posts"),
        (Method::GET, "/users/{id}/comments"),
    ]);
    let (_, posts) = matched(router.lookup(&Method::GET, "/users/123/posts"));
    assert_eq!(posts, vec![("user_id".to_string(), "123".to_string())]);
    let (_, comments) = matched(router.lookup(&Method::GET, "/users/456/comments"));
    assert_eq!(comments, vec![("id".to_string(), "456".to_string())]);
}

#[test]
fn test_not_found_vs_method_not_allowed() {
    let router = router(&[(Method::GET, "/items"), (Method::POST, "/items")]);
    assert!(matches!(
        router.lookup(&Method::GET, "/nothing"),
        RouteLookup::NotFound
    ));
    match router.lookup(&Method::DELETE, "/items") {
        RouteLookup::MethodNotAllowed { allowed } => {
            assert_eq!(allowed, vec![Method::GET, Method::POST]);
        }
        other => panic!("expected 405, got {other:?}"),
    }
}

#[test]
fn test_intermediate_node_is_not_a_route() {
    let router = router(&[(Method::GET, "/a/b/c")]);
    assert!(matches!(
        router.lookup(&Method::GET, "/a/b"),
        RouteLookup::NotFound
    ));
}

#[test]
fn test_duplicate_registration_rejected() {
    let mut router = Router::new();
    let route = RouteTemplate::parse("/pets").unwrap();
    router.insert(Method::GET, &route, 1).unwrap();
    assert_eq!(
        router.insert(Method::GET, &route, 2),
        Err(RouteError::DuplicateRoute {
            method: Method::GET,
            route: "/pets".to_string()
        })
    );
    assert_eq!(router.len(), 1);
}

#[test]
fn test_many_routes() {
    let mut router = Router::new();
    for i in 0..500 {
        let route = RouteTemplate::parse(&format!("/api/v1/resource{i}/{{id}}")).unwrap();
        router.insert(Method::GET, &route, i).unwrap();
    }
    match router.lookup(&Method::GET, "/api/v1/resource499/abc") {
        RouteLookup::Match { payload, .. } => assert_eq!(*payload, 499),
        other => panic!("unexpected {other:?}"),
    }
}
