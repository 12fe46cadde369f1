//! Contract Test: BinaryLane provider
//!
//! Runs the provider against an in-memory API.
//!
//! Constraints verified:
//! - Planned corrections name the BinaryLane ID of what they touch
//! - Applying a plan converges: re-planning yields no changes
//! - Desired records are raised to the 600s TTL floor
//! - BinaryLane's own apex NS records are never planned
//! - Planning alone never mutates the zone
//! - Relative hostname targets converge once applied

mod common;

use common::FakeRecordApi;
use std::sync::Arc;
use zonesync_core::config::{EngineConfig, ExecutionPolicy, ZoneConfig};
use zonesync_core::engine::ZoneReconciler;
use zonesync_core::error::Error;
use zonesync_core::record::{CanonicalRecord, RecordData};
use zonesync_core::traits::DnsProvider;
use zonesync_provider_binarylane::BinaryLaneProvider;
use zonesync_provider_binarylane::api::RecordApi;

const ZONE: &str = "example.com";

fn provider(api: &Arc<FakeRecordApi>) -> BinaryLaneProvider {
    let api: Arc<dyn RecordApi> = api.clone();
    BinaryLaneProvider::with_api(api)
}

fn a(label: &str, ip: &str, ttl: u32) -> CanonicalRecord {
    CanonicalRecord::new(
        label,
        ZONE,
        ttl,
        RecordData::A {
            target: ip.to_string(),
        },
    )
}

async fn plan_messages(
    provider: &BinaryLaneProvider,
    desired: Vec<CanonicalRecord>,
) -> zonesync_core::Result<Vec<String>> {
    let existing = provider.get_zone_records(ZONE).await?;
    let plan = provider.get_zone_records_corrections(ZONE, desired, existing)?;
    Ok(plan.corrections.iter().map(|c| c.msg.clone()).collect())
}

#[tokio::test]
async fn change_create_delete_reference_ids() {
    let api = FakeRecordApi::new();
    api.seed(10, "www", "A", "1.2.3.4", 600);
    api.seed(20, "old", "A", "1.1.1.1", 600);
    let provider = provider(&api);

    let msgs = plan_messages(
        &provider,
        vec![a("www", "1.2.3.5", 600), a("api", "9.9.9.9", 600)],
    )
    .await
    .unwrap();

    assert_eq!(
        msgs,
        vec![
            "- DELETE old.example.com A 1.1.1.1 ttl=600, binarylane ID: 20",
            "± MODIFY www.example.com A (1.2.3.4 ttl=600) -> (1.2.3.5 ttl=600), binarylane ID: 10",
            "+ CREATE api.example.com A 9.9.9.9 ttl=600",
        ]
    );
    assert_eq!(api.mutation_count(), 0);
}

#[tokio::test]
async fn ttl_floor_and_apex_nameservers() {
    let api = FakeRecordApi::new();
    api.seed(1, "@", "NS", "ns1.binarylane.com.au", 3600);
    api.seed(2, "@", "NS", "ns2.binarylane.com.au", 3600);
    let provider = provider(&api);

    let ns = |target: &str| {
        CanonicalRecord::new(
            "@",
            ZONE,
            3600,
            RecordData::Ns {
                target: target.to_string(),
            },
        )
    };

    let msgs = plan_messages(
        &provider,
        vec![
            ns("ns1.binarylane.com.au."),
            ns("ns2.binarylane.com.au."),
            a("www", "1.2.3.4", 300),
        ],
    )
    .await
    .unwrap();

    assert_eq!(msgs, vec!["+ CREATE www.example.com A 1.2.3.4 ttl=600"]);

    // Leaving them out of the desired set does not delete them either
    let msgs = plan_messages(&provider, vec![]).await.unwrap();
    assert!(msgs.is_empty(), "got {:?}", msgs);
}

#[tokio::test]
async fn structured_types_round_trip_through_the_api() {
    let api = FakeRecordApi::new();
    let provider = provider(&api);

    let desired = vec![
        CanonicalRecord::new(
            "@",
            ZONE,
            3600,
            RecordData::Caa {
                flag: 0,
                tag: "issue".to_string(),
                target: "letsencrypt.org".to_string(),
            },
        ),
        CanonicalRecord::new(
            "_sip._tcp",
            ZONE,
            3600,
            RecordData::Srv {
                priority: 10,
                weight: 5,
                port: 5060,
                target: "sip.example.com.".to_string(),
            },
        ),
        CanonicalRecord::new(
            "@",
            ZONE,
            3600,
            RecordData::Mx {
                preference: 10,
                target: "mail.example.com.".to_string(),
            },
        ),
    ];

    let existing = provider.get_zone_records(ZONE).await.unwrap();
    let plan = provider
        .get_zone_records_corrections(ZONE, desired.clone(), existing)
        .unwrap();
    assert_eq!(plan.change_count, 3);
    for correction in &plan.corrections {
        correction.execute().await.unwrap();
    }

    let caa = api
        .records()
        .into_iter()
        .find(|r| r.rtype == "CAA")
        .expect("CAA record stored");
    assert_eq!(caa.data, "0 issue \"letsencrypt.org\"");

    let existing = provider.get_zone_records(ZONE).await.unwrap();
    let replan = provider
        .get_zone_records_corrections(ZONE, desired, existing)
        .unwrap();
    assert_eq!(replan.change_count, 0);
}

#[tokio::test]
async fn relative_hostname_targets_converge() {
    let api = FakeRecordApi::new();
    let provider = provider(&api);

    let desired = vec![
        CanonicalRecord::new(
            "www",
            ZONE,
            600,
            RecordData::Cname {
                target: "example.com".to_string(),
            },
        ),
        CanonicalRecord::new(
            "@",
            ZONE,
            600,
            RecordData::Mx {
                preference: 10,
                target: "mail.example.com".to_string(),
            },
        ),
    ];

    let existing = provider.get_zone_records(ZONE).await.unwrap();
    let plan = provider
        .get_zone_records_corrections(ZONE, desired.clone(), existing)
        .unwrap();
    assert_eq!(plan.change_count, 2);
    for correction in &plan.corrections {
        correction.execute().await.unwrap();
    }
    assert_eq!(api.mutation_count(), 2);

    let msgs = plan_messages(&provider, desired).await.unwrap();
    assert!(msgs.is_empty(), "got {:?}", msgs);
}

#[tokio::test]
async fn reconciler_converges_against_binarylane() {
    let api = FakeRecordApi::new();
    api.seed(10, "www", "A", "1.2.3.4", 600);
    api.seed(20, "old", "A", "1.1.1.1", 600);
    api.seed(30, "@", "MX", "mail.example.com", 600);

    let (reconciler, _events) = ZoneReconciler::new(
        Box::new(provider(&api)),
        EngineConfig::default(),
    )
    .unwrap();

    let zone = ZoneConfig::new(
        ZONE,
        vec![
            a("www", "1.2.3.5", 600),
            a("api", "9.9.9.9", 60),
            CanonicalRecord::new(
                "@",
                ZONE,
                600,
                RecordData::Mx {
                    preference: 0,
                    target: "mail.example.com.".to_string(),
                },
            ),
        ],
    );

    let report = reconciler.reconcile_zone(&zone).await.unwrap();
    assert_eq!(report.planned, 3);
    assert!(report.is_converged());

    let second = reconciler.plan_zone(&zone).await.unwrap();
    assert_eq!(second.change_count, 0);
    assert_eq!(api.fetch_call_count(), 2);
}

#[tokio::test]
async fn transport_failures_are_attributed() {
    let api = FakeRecordApi::new();
    api.seed(10, "www", "A", "1.2.3.4", 600);
    api.fail_mutations("binarylane API error: BinaryLane server error (transient). (502 Bad Gateway)");

    let config = EngineConfig {
        execution_policy: ExecutionPolicy::AbortOnFirstError,
        ..Default::default()
    };
    let (reconciler, _events) = ZoneReconciler::new(Box::new(provider(&api)), config).unwrap();

    let zone = ZoneConfig::new(ZONE, vec![a("www", "5.6.7.8", 600), a("api", "9.9.9.9", 600)]);
    let report = reconciler.reconcile_zone(&zone).await.unwrap();

    assert_eq!(report.applied, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].is_transport());
    assert!(report.failures[0].to_string().contains("binarylane ID: 10"));
}

#[tokio::test]
async fn malformed_native_record_fails_the_zone() {
    let api = FakeRecordApi::new();
    api.seed(42, "@", "CAA", "0 issue", 600);
    let provider = provider(&api);

    let err = provider.get_zone_records(ZONE).await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    assert!(err.to_string().contains("binarylane ID: 42"));
}

#[tokio::test]
async fn zones_and_nameservers() {
    let api = FakeRecordApi::new();
    let provider = provider(&api);

    assert_eq!(
        provider.list_zones().await.unwrap(),
        vec!["example.com", "example.net"]
    );
    assert_eq!(
        provider.get_nameservers(ZONE).await.unwrap(),
        vec!["ns1.binarylane.com.au", "ns2.binarylane.com.au"]
    );
}
