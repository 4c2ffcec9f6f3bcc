//! End-to-end engine behaviour over realistic responses

use httpmutator_core::{
    Engine, MutantGroup, MutatorKind, OperatorKind, Response, CHARSET_LOCATION,
    LOCATION_LOCATION, MEDIA_TYPE_LOCATION, STATUS_CODE_LOCATION,
};
use httpmutator_test_utils::{
    engine, engine_with, identifiers, response_from, rich_response, scenario_response,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

fn group<'a>(groups: &'a [MutantGroup], identifier: &str) -> &'a MutantGroup {
    groups
        .iter()
        .find(|g| g.identifier() == identifier)
        .unwrap_or_else(|| panic!("no group {identifier}"))
}

/// `200 application/json {"a":1}` yields the documented groups
#[test]
fn scenario_produces_status_media_type_and_body_groups() {
    let mut engine = engine(42);
    let groups = engine.collect_groups(&scenario_response()).unwrap();

    assert_eq!(
        identifiers(&groups),
        vec![STATUS_CODE_LOCATION, MEDIA_TYPE_LOCATION, "Body", "Body/a"]
    );

    let status = group(&groups, STATUS_CODE_LOCATION);
    assert_eq!(status.len(), 3);
    let pools: [&[u16]; 3] = [
        &[200, 201, 202, 204],
        &[400, 401, 403, 404, 409],
        &[500, 501, 502, 503, 504],
    ];
    for (mutant, pool) in status.mutants().iter().zip(pools) {
        let code = mutant.response().status_code();
        assert_ne!(code, 200);
        assert!(pool.contains(&code), "{code} not in {pool:?}");
    }

    let media = group(&groups, MEDIA_TYPE_LOCATION);
    assert!(!media.is_empty());
    for mutant in media.mutants() {
        if let Some(content_type) = mutant.response().headers().get("Content-Type") {
            assert!(!content_type.to_ascii_lowercase().contains("charset"));
        }
    }

    let body = group(&groups, "Body");
    assert!(body.mutants().iter().any(|m| {
        m.operator() == OperatorKind::RemoveElement && m.response().body() == &json!({})
    }));
}

/// Each mutant changes exactly the component its group names
#[test]
fn mutants_only_touch_their_component() {
    let original = rich_response();
    let mut engine = engine(7);
    for group in engine.groups(&original) {
        let group = group.unwrap();
        for mutant in group.mutants() {
            let mutated = mutant.response();
            match mutant.mutator() {
                MutatorKind::StatusCode => {
                    assert!(mutated.shares_headers_with(&original));
                    assert!(mutated.shares_body_with(&original));
                }
                MutatorKind::MediaType | MutatorKind::Charset | MutatorKind::Location => {
                    assert_eq!(mutated.status_code(), original.status_code());
                    assert!(mutated.shares_body_with(&original));
                    assert_eq!(
                        mutated.headers().get("X-Request-Id"),
                        original.headers().get("X-Request-Id")
                    );
                }
                _ => {
                    assert_eq!(mutated.status_code(), original.status_code());
                    assert!(mutated.shares_headers_with(&original));
                }
            }
        }
    }
}

#[test]
fn rich_response_visits_every_site_in_document_order() {
    let mut engine = engine(1);
    let groups = engine.collect_groups(&rich_response()).unwrap();
    assert_eq!(
        identifiers(&groups),
        vec![
            STATUS_CODE_LOCATION,
            MEDIA_TYPE_LOCATION,
            CHARSET_LOCATION,
            LOCATION_LOCATION,
            "Body",
            "Body/id",
            "Body/total",
            "Body/paid",
            "Body/note",
            "Body/customer",
            "Body/customer/name",
            "Body/customer/tier",
            "Body/items",
            "Body/items/0",
            "Body/items/0/sku",
            "Body/items/0/qty",
            "Body/items/1",
            "Body/items/1/sku",
            "Body/items/1/qty",
            "Body/items/2",
            "Body/items/2/sku",
            "Body/items/2/qty",
        ]
    );
}

#[test]
fn nested_site_mutants_replace_only_that_site() {
    let original = rich_response();
    let mut engine = engine(3);
    let groups = engine.collect_groups(&original).unwrap();
    for mutant in group(&groups, "Body/items/1/qty").mutants() {
        let body = mutant.response().body();
        assert_eq!(body["items"][0], original.body()["items"][0]);
        assert_eq!(body["items"][2], original.body()["items"][2]);
        assert_eq!(body["customer"], original.body()["customer"]);
        assert_ne!(body["items"][1]["qty"], json!(1));
        assert_eq!(mutant.mutator(), MutatorKind::Long);
    }
}

#[test]
fn null_body_and_empty_headers_are_handled() {
    let mut engine = engine(42);
    let response = response_from(json!({"Status Code": 404, "Headers": {}, "Body": null}));
    let groups = engine.collect_groups(&response).unwrap();
    assert_eq!(identifiers(&groups), vec![STATUS_CODE_LOCATION]);
}

#[test]
fn array_applicability_follows_configured_max() {
    let mut engine = engine_with(
        5,
        &[
            ("operator.array.removeElement.min", json!(1)),
            ("operator.array.removeElement.max", json!(2)),
            ("operator.body.recursive", json!(false)),
        ],
    );
    let kinds = |engine: &mut Engine, body: Value| -> Vec<OperatorKind> {
        let response = response_from(json!({"Status Code": 200, "Body": body}));
        let groups = engine.collect_groups(&response).unwrap();
        groups
            .iter()
            .find(|g| g.identifier() == "Body")
            .map(|g| g.mutants().iter().map(|m| m.operator()).collect())
            .unwrap_or_default()
    };

    let two = kinds(&mut engine, json!([1, 2]));
    assert!(!two.contains(&OperatorKind::RemoveElement));
    assert!(two.contains(&OperatorKind::DisorderElements));

    let three = kinds(&mut engine, json!([1, 2, 3]));
    assert!(three.contains(&OperatorKind::RemoveElement));

    let one = kinds(&mut engine, json!([1]));
    assert!(!one.contains(&OperatorKind::DisorderElements));

    let empty = kinds(&mut engine, json!([]));
    assert!(!empty.contains(&OperatorKind::Empty));
}

#[test]
fn disabled_status_mutator_yields_no_status_group() {
    let mut engine = engine_with(1, &[("operator.sc.enabled", json!(false))]);
    let groups = engine.collect_groups(&scenario_response()).unwrap();
    assert!(!identifiers(&groups).contains(&STATUS_CODE_LOCATION));
}

#[test]
fn zero_probability_gate_skips_header_mutants() {
    let mut engine = engine_with(1, &[("operator.header.mediaType.prob", json!(0.0))]);
    let groups = engine.collect_groups(&scenario_response()).unwrap();
    assert!(!identifiers(&groups).contains(&MEDIA_TYPE_LOCATION));
}

#[test]
fn configuration_errors_surface_at_construction() {
    let props = httpmutator_core::Properties::defaults()
        .unwrap()
        .with("operator.header.charset.replace.values", vec!["UTF-8"]);
    assert!(Engine::new(&props, 1).is_err());
}

fn to_values(groups: &[MutantGroup]) -> Vec<(String, Value, &'static str)> {
    groups
        .iter()
        .flat_map(|g| {
            g.mutants()
                .iter()
                .map(move |m| (g.identifier().to_string(), m.response().to_value(), m.operator().name()))
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn same_seed_same_mutants(seed in any::<u64>()) {
        let response: Response = rich_response();
        let first = engine(seed).collect_groups(&response).unwrap();
        let second = engine(seed).collect_groups(&response).unwrap();
        prop_assert_eq!(to_values(&first), to_values(&second));
    }

    #[test]
    fn status_mutants_never_repeat_the_original(seed in any::<u64>(), status in prop::sample::select(vec![200_u16, 201, 204, 400, 404, 500, 503])) {
        let response = response_from(json!({"Status Code": status}));
        let groups = engine(seed).collect_groups(&response).unwrap();
        for mutant in groups[0].mutants() {
            prop_assert_ne!(mutant.response().status_code(), status);
        }
    }
}
