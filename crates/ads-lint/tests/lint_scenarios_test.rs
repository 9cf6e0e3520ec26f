//! End-to-end lint scenarios against packs loaded through the provider.

use ads_core::{HttpMethod, RequestSpec};
use ads_lint::{Error, IssueCode, LintEngine, lint};
use ads_schema::{SchemaPack, SchemaProvider};
use std::path::PathBuf;

fn scenario_pack() -> SchemaPack {
    SchemaProvider::default()
        .load_from_json(
            r#"{
                "domain": "marketing",
                "version": "v21.0",
                "entities": {"ad": ["id", "name", "status", "adset_id", "creative"]},
                "endpoint_params": {"ad.post": ["name", "adset_id", "status", "creative"]},
                "deprecated_params": {"ad.post": ["legacy_param"]}
            }"#,
        )
        .expect("scenario pack should parse")
}

fn ad_create() -> RequestSpec {
    RequestSpec::new(HttpMethod::Post, "act_0/ads")
        .unwrap()
        .with_param("name", "Spring sale")
        .with_param("adset_id", "2385")
        .with_param("status", "PAUSED")
        .with_param("creative", r#"{"creative_id":"771"}"#)
}

#[test]
fn full_ad_create_lints_clean_under_strict() {
    let result = lint(&scenario_pack(), &ad_create(), true);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn legacy_param_warns_once_under_either_mode() {
    let spec = ad_create().with_param("legacy_param", "1");
    for strict in [true, false] {
        let result = lint(&scenario_pack(), &spec, strict);
        assert!(result.errors.is_empty(), "strict={strict}");
        assert_eq!(result.warnings.len(), 1, "strict={strict}");
        assert!(result.warnings[0].message.contains("legacy_param"));
        // deprecation alone never blocks
        assert!(result.into_result(&spec).is_ok());
    }
}

#[test]
fn unknown_param_blocks_only_when_strict() {
    let spec = ad_create().with_param("bid_amount", "300");

    let strict = lint(&scenario_pack(), &spec, true);
    assert_eq!(strict.errors.len(), 1);
    assert!(strict.errors[0].message.contains("bid_amount"));
    let err = strict.into_result(&spec).unwrap_err();
    let Error::Violations { method, path, issues } = err;
    assert_eq!(method, "POST");
    assert_eq!(path, "act_0/ads");
    assert_eq!(issues[0].code, IssueCode::UnknownParam);

    let lenient = lint(&scenario_pack(), &spec, false);
    assert!(lenient.errors.is_empty());
    assert_eq!(lenient.warnings.len(), 1);
    assert!(lenient.warnings[0].message.contains("bid_amount"));
}

#[test]
fn bundled_pack_accepts_a_typical_adset_create() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../schemas");
    let pack = SchemaProvider::new(root)
        .get_pack("marketing", "v21.0")
        .unwrap();

    let spec = RequestSpec::new(HttpMethod::Post, "act_12/adsets")
        .unwrap()
        .with_param("name", "Prospecting")
        .with_param("campaign_id", "99")
        .with_param("daily_budget", "5000")
        .with_param("billing_event", "IMPRESSIONS")
        .with_param("optimization_goal", "REACH")
        .with_param("targeting", r#"{"geo_locations":{"countries":["US"]}}"#);

    let result = LintEngine::new(true).lint(&pack, &spec);
    assert!(result.is_clean(), "{:?}", result.warning_messages());
}

#[test]
fn strict_rejects_everything_sent_to_an_undeclared_collection() {
    let typo = RequestSpec::new(HttpMethod::Post, "act_0/adz")
        .unwrap()
        .with_param("anything", "1")
        .with_param("bogus", "2");
    let result = lint(&scenario_pack(), &typo, true);
    assert!(result.warnings.is_empty());
    let names: Vec<_> = result.errors.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["anything", "bogus"]);
    assert!(result.into_result(&typo).is_err());

    let read = RequestSpec::new(HttpMethod::Get, "act_0/campaigns")
        .unwrap()
        .with_fields(["spend", "whatever"]);
    let result = lint(&scenario_pack(), &read, true);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors.iter().all(|i| i.code == IssueCode::UnknownField));
}

#[test]
fn strict_rejects_params_on_object_paths() {
    let update = RequestSpec::new(HttpMethod::Post, "120330000")
        .unwrap()
        .with_param("bogus", "2");
    let result = lint(&scenario_pack(), &update, true);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, IssueCode::UnknownParam);
}

#[test]
fn get_filters_need_a_declared_get_endpoint() {
    let spec = RequestSpec::new(HttpMethod::Get, "act_0/ads")
        .unwrap()
        .with_fields(["id"])
        .with_param("bogus_filter", "2");

    let strict = lint(&scenario_pack(), &spec, true);
    assert_eq!(strict.errors.len(), 1);
    assert_eq!(strict.errors[0].context, "ad.get");

    let lenient = lint(&scenario_pack(), &spec, false);
    assert!(lenient.errors.is_empty());
    assert_eq!(lenient.warnings.len(), 1);
    assert_eq!(lenient.warnings[0].code, IssueCode::NoSchemaCoverage);
}
