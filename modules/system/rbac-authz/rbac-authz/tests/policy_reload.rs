#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for JSON policy loading and atomic registry reload

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rbac_authz::{RbacAuthzConfig, Service};
use rbac_authz_sdk::{PeerContext, attributes};
use serde_json::json;

fn principal_is(name: &str) -> serde_json::Value {
    json!({
        "op": "eq",
        "left": { "op": "attribute", "name": attributes::SOURCE_PRINCIPAL },
        "right": { "op": "literal", "value": name }
    })
}

fn config(value: &serde_json::Value) -> RbacAuthzConfig {
    serde_json::from_value(value.clone()).unwrap()
}

fn admin() -> PeerContext {
    PeerContext::builder()
        .source("10.20.30.40:5000".parse().unwrap())
        .principal("admin")
        .path("/helloworld.Greeter/SayHello")
        .build()
}

#[test]
fn loads_full_policy_document() {
    let svc = Service::from_json(
        &json!({
            "engines": [
                { "action": "DENY", "policies": {
                    "blockBadIP": { "condition": {
                        "op": "call", "function": "in_cidr",
                        "args": [
                            { "op": "attribute", "name": "source.address" },
                            { "op": "literal", "value": "203.0.113.0/24" }
                        ] } } } },
                { "action": "ALLOW", "policies": {
                    "allowAdmins": { "condition": principal_is("admin") },
                    "allowGreeter": { "condition": {
                        "op": "call", "function": "starts_with",
                        "args": [
                            { "op": "attribute", "name": "request.path" },
                            { "op": "literal", "value": "/helloworld.Greeter/" }
                        ] } } } }
            ]
        })
        .to_string(),
    )
    .unwrap();

    let report = svc.explain(&admin());
    assert!(report.allowed);
    assert_eq!(report.justification(), "Policy matched: allowAdmins");

    let registry = svc.snapshot();
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.engines()[1].policy_names().collect::<Vec<_>>(),
        ["allowAdmins", "allowGreeter"]
    );
}

#[test]
fn duplicate_policy_name_last_value_wins() {
    // serde_json::json! would dedupe keys itself, so use raw text
    let svc = Service::from_json(
        r#"{ "engines": [ { "action": "ALLOW", "policies": {
            "p": { "condition": { "op": "literal", "value": false } },
            "q": { "condition": { "op": "literal", "value": false } },
            "p": { "condition": { "op": "literal", "value": true } }
        } } ] }"#,
    )
    .unwrap();

    let registry = svc.snapshot();
    assert_eq!(
        registry.engines()[0].policy_names().collect::<Vec<_>>(),
        ["p", "q"]
    );
    assert_eq!(
        svc.explain(&admin()).justification(),
        "Policy matched: p"
    );
}

#[test]
fn invalid_condition_denies_instead_of_failing_load() {
    let svc = Service::from_config(&config(&json!({
        "engines": [ { "action": "ALLOW", "policies": {
            "typo": { "condition": {
                "op": "eq",
                "left": { "op": "attribute", "name": "source.principle" },
                "right": { "op": "literal", "value": "admin" } } },
            "regex": { "condition": { "op": "unsupported", "reason": "safe_regex" } }
        } } ]
    })))
    .unwrap();

    assert!(!svc.authorize(&admin()));
}

#[test]
fn reload_replaces_policies() {
    let svc = Service::from_config(&config(&json!({
        "engines": [ { "action": "ALLOW", "policies": {
            "allowAdmins": { "condition": principal_is("admin") } } } ]
    })))
    .unwrap();
    assert!(svc.authorize(&admin()));

    svc.reload(&config(&json!({
        "engines": [ { "action": "DENY", "policies": {
            "blockAdmins": { "condition": principal_is("admin") } } } ]
    })))
    .unwrap();

    let report = svc.explain(&admin());
    assert!(!report.allowed);
    assert_eq!(report.justification(), "Policy matched: blockAdmins");
}

#[test]
fn concurrent_checks_see_whole_registries() {
    // Registry A: allow admins. Registry B: deny admins, then allow all.
    // Either snapshot yields a well-formed report; no mixture can allow
    // through B's deny or deny under A.
    let allow = config(&json!({
        "engines": [ { "action": "ALLOW", "policies": {
            "allowAdmins": { "condition": principal_is("admin") } } } ]
    }));
    let deny = config(&json!({
        "engines": [
            { "action": "DENY", "policies": {
                "blockAdmins": { "condition": principal_is("admin") } } },
            { "action": "ALLOW", "policies": {
                "allowAll": { "condition": { "op": "literal", "value": true } } } }
        ]
    }));

    let svc = Arc::new(Service::from_config(&allow).unwrap());
    let done = AtomicBool::new(false);
    let peer = admin();

    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..200 {
                let next = if i % 2 == 0 { &deny } else { &allow };
                svc.reload(next).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let report = svc.explain(&peer);
                    match report.decisions.len() {
                        1 => {
                            let j = report.justification();
                            assert!(
                                j == "Policy matched: allowAdmins"
                                    || j == "Policy matched: blockAdmins",
                                "unexpected justification {j}"
                            );
                            assert_eq!(report.allowed, j.ends_with("allowAdmins"));
                        }
                        n => panic!("torn registry: {n} decisions"),
                    }
                }
            });
        }
    });

    assert!(svc.authorize(&peer));
}

#[test]
fn default_config_denies() {
    let svc = Service::from_config(&RbacAuthzConfig::default()).unwrap();
    assert!(!svc.authorize(&admin()));
}
