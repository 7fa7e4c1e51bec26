#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Detaching objects from policy rules against the in-memory backend.

use std::sync::Arc;

use static_zpa_policy_plugin::{SeedRule, Service as StaticBackend};
use zpa_policy::domain::PolicyListLocks;
use zpa_policy::{Service, ZpaPolicyConfig, ZpaPolicyLocalClient};
use zpa_policy_sdk::conditions::{Condition, Operand, decompile_conditions, object_types};
use zpa_policy_sdk::{
    DetachRequest, DetachedRule, PolicyRulesClient, PolicyRulesError, PolicyScope, PolicyType,
};

fn scope(policy_type: PolicyType) -> PolicyScope {
    PolicyScope::new(policy_type)
}

fn app_rule(id: &str, apps: &[&str]) -> SeedRule {
    SeedRule::new(id, format!("rule {id}")).with_conditions(vec![Condition::or(vec![
        Operand::values(object_types::APP, apps.iter().copied()),
        Operand::entries(object_types::POSTURE, [("posture-1", "true")]),
    ])])
}

fn only_app_rule(id: &str, apps: &[&str]) -> SeedRule {
    SeedRule::new(id, format!("rule {id}")).with_conditions(vec![Condition::and(vec![
        Operand::values(object_types::APP, apps.iter().copied()),
    ])])
}

#[tokio::test]
async fn detach_removes_object_from_every_configured_policy_type() {
    let backend = Arc::new(StaticBackend::new());
    backend.seed(
        &scope(PolicyType::AccessPolicy),
        vec![
            app_rule("a1", &["app-1", "app-2"]),
            app_rule("a2", &["app-3"]),
            only_app_rule("a3", &["app-1"]),
        ],
    );
    backend.seed(
        &scope(PolicyType::TimeoutPolicy),
        vec![app_rule("t1", &["app-1"])],
    );
    backend.seed(
        &scope(PolicyType::CredentialPolicy),
        vec![app_rule("c1", &["app-1"])],
    );

    let client = ZpaPolicyLocalClient::new(Arc::new(Service::new(
        backend.clone(),
        ZpaPolicyConfig::default(),
    )));
    let outcome = client
        .detach_object(DetachRequest::new(object_types::APP, "app-1"))
        .await
        .unwrap();

    assert_eq!(
        outcome.updated_rules,
        vec![
            DetachedRule {
                policy_type: PolicyType::AccessPolicy,
                rule_id: "a1".to_owned(),
            },
            DetachedRule {
                policy_type: PolicyType::AccessPolicy,
                rule_id: "a3".to_owned(),
            },
            DetachedRule {
                policy_type: PolicyType::TimeoutPolicy,
                rule_id: "t1".to_owned(),
            },
        ]
    );
    assert_eq!(backend.update_calls(), 3);

    let access = backend.rules(&scope(PolicyType::AccessPolicy));
    let a1 = decompile_conditions(&access[0].conditions);
    assert_eq!(
        a1,
        vec![Condition::or(vec![
            Operand::values(object_types::APP, ["app-2"]),
            Operand::entries(object_types::POSTURE, [("posture-1", "true")]),
        ])]
    );
    // Left without operands, the condition is dropped.
    assert!(access[2].conditions.is_empty());

    // The timeout rule keeps its posture clause.
    let t1 = decompile_conditions(&backend.rules(&scope(PolicyType::TimeoutPolicy))[0].conditions);
    assert_eq!(t1[0].operands.len(), 1);
    assert_eq!(t1[0].operands[0].object_type, object_types::POSTURE);

    // Credential policy is not swept by default.
    let c1 = decompile_conditions(&backend.rules(&scope(PolicyType::CredentialPolicy))[0].conditions);
    assert!(c1[0].operands[0].values.contains("app-1"));
}

#[tokio::test]
async fn detach_honours_microtenant_scope() {
    let backend = Arc::new(StaticBackend::new());
    let mt = scope(PolicyType::AccessPolicy).with_microtenant(Some("mt-1"));
    backend.seed(&mt, vec![app_rule("m1", &["app-1"])]);
    backend.seed(&scope(PolicyType::AccessPolicy), vec![app_rule("g1", &["app-1"])]);

    let config = ZpaPolicyConfig {
        detach_policy_types: vec![PolicyType::AccessPolicy],
        ..ZpaPolicyConfig::default()
    };
    let svc = Service::new(backend.clone(), config);
    let outcome = svc
        .detach_object(DetachRequest::new(object_types::APP, "app-1").with_microtenant("mt-1"))
        .await
        .unwrap();

    assert_eq!(outcome.updated_rules.len(), 1);
    assert_eq!(outcome.updated_rules[0].rule_id, "m1");
    let global = decompile_conditions(&backend.rules(&scope(PolicyType::AccessPolicy))[0].conditions);
    assert!(global[0].operands[0].values.contains("app-1"));
}

#[tokio::test]
async fn detach_waits_for_a_held_policy_list_lock() {
    let backend = Arc::new(StaticBackend::new());
    backend.seed(&scope(PolicyType::AccessPolicy), vec![app_rule("a1", &["app-1"])]);

    let locks = Arc::new(PolicyListLocks::new());
    let config = ZpaPolicyConfig {
        detach_policy_types: vec![PolicyType::AccessPolicy],
        ..ZpaPolicyConfig::default()
    };
    let svc = Arc::new(Service::new(backend.clone(), config).with_locks(Arc::clone(&locks)));

    let guard = locks.acquire(&scope(PolicyType::AccessPolicy)).await;
    let task = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move {
            svc.detach_object(DetachRequest::new(object_types::APP, "app-1"))
                .await
        })
    };

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(backend.update_calls(), 0);
    drop(guard);

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.updated_rules.len(), 1);
    assert_eq!(backend.update_calls(), 1);
}

#[tokio::test]
async fn blank_detach_target_is_a_declaration_error() {
    let backend = Arc::new(StaticBackend::new());
    let client = ZpaPolicyLocalClient::new(Arc::new(Service::new(
        backend,
        ZpaPolicyConfig::default(),
    )));
    let err = client
        .detach_object(DetachRequest::new("", "app-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyRulesError::InvalidDeclaration(_)));
}
