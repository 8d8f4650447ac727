use std::io;
use std::sync::{Arc, Mutex};

use rust_decimal_macros::dec;
use spendpolicy::{
    CategoryId, EngineConfig, ExecutionError, InMemoryDirectory, InMemoryPolicyStore, OrgId,
    Policy, PolicyEngine, PolicyError, PolicyId, PolicyStore, RecordingObserver, ResolveQuery,
    ReviewMode, ScopeClass, StorageError, UserId,
};
use tracing_subscriber::EnvFilter;

fn acme() -> OrgId {
    OrgId::new("acme").unwrap()
}

fn globex() -> OrgId {
    OrgId::new("globex").unwrap()
}

struct Fixture {
    store: Arc<InMemoryPolicyStore>,
    directory: Arc<InMemoryDirectory>,
    observer: Arc<RecordingObserver>,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(InMemoryPolicyStore::new());
        let directory = Arc::new(InMemoryDirectory::new());
        directory.add_member(acme(), UserId::new("alice").unwrap()).unwrap();
        directory.add_member(acme(), UserId::new("bob").unwrap()).unwrap();
        directory.add_category(acme(), CategoryId::new("travel").unwrap()).unwrap();

        let org = || Policy::builder().org(acme());
        store
            .insert(org().name("Default").max_amount(dec!(100)).build().unwrap())
            .unwrap();
        store
            .insert(
                org()
                    .name("Travel")
                    .category(CategoryId::new("travel").unwrap())
                    .max_amount(dec!(200))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        store
            .insert(
                org()
                    .name("Alice")
                    .user(UserId::new("alice").unwrap())
                    .max_amount(dec!(300))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        store
            .insert(
                org()
                    .name("Alice travel")
                    .user(UserId::new("alice").unwrap())
                    .category(CategoryId::new("travel").unwrap())
                    .max_amount(dec!(400))
                    .review_mode(ReviewMode::AutoApprove)
                    .build()
                    .unwrap(),
            )
            .unwrap();

        // Another tenant's policy must not leak into acme's resolutions.
        store
            .insert(
                Policy::builder()
                    .org(globex())
                    .name("Globex default")
                    .max_amount(dec!(5000))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        Self {
            store,
            directory,
            observer: Arc::new(RecordingObserver::new()),
        }
    }

    fn engine(&self) -> PolicyEngine {
        PolicyEngine::new(self.store.clone(), self.directory.clone()).with_observer(self.observer.clone())
    }
}

#[test]
fn evaluate_alice_travel_end_to_end() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let query = ResolveQuery::parse("alice", Some("travel")).unwrap();

    let evaluation = engine.evaluate(&acme(), &query, dec!(400)).unwrap();
    assert!(evaluation.allowed());
    assert_eq!(evaluation.resolution.applicable_policies.len(), 4);

    let governing = evaluation.governing_policy().unwrap();
    assert_eq!(governing.details.name, "Alice travel");
    assert_eq!(governing.details.review_mode, ReviewMode::AutoApprove);

    let over = engine.evaluate(&acme(), &query, dec!(400.01)).unwrap();
    assert!(!over.allowed());
    assert_eq!(over.limit.reason, "Amount 400.01 exceeds policy limit of 400");
}

#[test]
fn evaluate_bob_travel_uses_org_category() {
    let fx = Fixture::new();
    let query = ResolveQuery::parse("bob", Some("travel")).unwrap();

    let evaluation = fx.engine().evaluate(&acme(), &query, dec!(150)).unwrap();
    assert_eq!(evaluation.resolution.selected_scope(), Some(ScopeClass::OrgCategory));
    assert_eq!(evaluation.limit.limit, Some(dec!(200)));
    assert!(evaluation.allowed());
}

#[test]
fn non_member_is_rejected_before_resolution() {
    let fx = Fixture::new();
    let query = ResolveQuery::parse("mallory", None).unwrap();

    let err = fx.engine().evaluate(&acme(), &query, dec!(1)).unwrap_err();
    assert!(matches!(
        err,
        PolicyError::Execution(ExecutionError::NotAMember { .. })
    ));
    assert!(fx.observer.is_empty());
}

#[test]
fn foreign_category_is_rejected() {
    let fx = Fixture::new();
    let query = ResolveQuery::parse("alice", Some("yachts")).unwrap();

    let err = fx.engine().resolve(&acme(), &query).unwrap_err();
    assert!(matches!(
        err,
        PolicyError::Execution(ExecutionError::CategoryNotFound { .. })
    ));
}

#[test]
fn verification_can_be_disabled() {
    let fx = Fixture::new();
    let config = EngineConfig::from_json(r#"{ "verify_membership": false, "verify_category": false }"#)
        .unwrap();
    let engine = fx.engine().with_config(config).unwrap();

    // Unknown user and category still resolve against org-wide defaults.
    let query = ResolveQuery::parse("mallory", Some("yachts")).unwrap();
    let resolution = engine.resolve(&acme(), &query).unwrap();
    assert_eq!(resolution.selected_scope(), Some(ScopeClass::OrgWide));
    assert_eq!(resolution.applicable_policies.len(), 1);
}

#[test]
fn tenants_are_isolated_by_the_store() {
    let fx = Fixture::new();
    let query = ResolveQuery::parse("alice", None).unwrap();

    let resolution = fx.engine().resolve(&acme(), &query).unwrap();
    assert!(resolution
        .applicable_policies
        .iter()
        .all(|a| a.policy.org_id == acme()));
}

#[test]
fn org_without_policies_denies() {
    let fx = Fixture::new();
    let initech = OrgId::new("initech").unwrap();
    fx.directory.add_member(initech.clone(), UserId::new("peter").unwrap()).unwrap();

    let query = ResolveQuery::parse("peter", None).unwrap();
    let evaluation = fx.engine().evaluate(&initech, &query, dec!(0)).unwrap();
    assert!(!evaluation.allowed());
    assert_eq!(evaluation.limit.reason, "No applicable policy found");
    assert_eq!(
        evaluation.resolution.selection_reason,
        "No applicable policy found for user peter"
    );
}

#[test]
fn observers_see_every_successful_evaluation() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let alice = ResolveQuery::parse("alice", None).unwrap();
    let bob = ResolveQuery::parse("bob", Some("travel")).unwrap();

    engine.evaluate(&acme(), &alice, dec!(10)).unwrap();
    engine.evaluate(&acme(), &bob, dec!(999)).unwrap();

    let seen = fx.observer.drain();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].query, alice);
    assert!(seen[0].allowed());
    assert_eq!(seen[1].query, bob);
    assert!(!seen[1].allowed());
    assert!(fx.observer.is_empty());
}

#[test]
fn store_updates_are_visible_on_next_call() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let query = ResolveQuery::parse("bob", None).unwrap();

    let before = engine.evaluate(&acme(), &query, dec!(150)).unwrap();
    assert!(!before.allowed());

    let mut default = before.governing_policy().unwrap().clone();
    default.max_amount = dec!(150);
    fx.store.update(default).unwrap();

    let after = engine.evaluate(&acme(), &query, dec!(150)).unwrap();
    assert!(after.allowed());
}

/// Log sink shared with a `fmt` subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Runs `f` with this crate's events captured at trace level.
fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("spendpolicy=trace"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs.contents())
}

/// Hands back every policy it holds regardless of the requested org.
struct UnscopedStore(Vec<Policy>);

impl PolicyStore for UnscopedStore {
    fn insert(&self, _policy: Policy) -> Result<(), StorageError> {
        Err(StorageError::BackendError("read-only".to_string()))
    }

    fn get(&self, id: &PolicyId) -> Result<Option<Policy>, StorageError> {
        Ok(self.0.iter().find(|p| &p.id == id).cloned())
    }

    fn update(&self, _policy: Policy) -> Result<(), StorageError> {
        Err(StorageError::BackendError("read-only".to_string()))
    }

    fn delete(&self, _id: &PolicyId) -> Result<(), StorageError> {
        Err(StorageError::BackendError("read-only".to_string()))
    }

    fn list_for_org(&self, _org_id: &OrgId) -> Result<Vec<Policy>, StorageError> {
        Ok(self.0.clone())
    }
}

#[test]
fn trace_logging_reports_each_applicable_policy() {
    let fx = Fixture::new();
    let query = ResolveQuery::parse("alice", Some("travel")).unwrap();

    let (plain, quiet_logs) = with_captured_logs(|| fx.engine().resolve(&acme(), &query).unwrap());
    assert!(quiet_logs.contains("resolved spend policy"));
    assert!(!quiet_logs.contains("applicable policy"));

    let config = EngineConfig {
        log_trace: true,
        ..EngineConfig::default()
    };
    let traced_engine = fx.engine().with_config(config).unwrap();
    let (traced, logs) = with_captured_logs(|| traced_engine.resolve(&acme(), &query).unwrap());

    assert_eq!(plain, traced);
    assert_eq!(logs.matches("applicable policy").count(), 4);
    assert!(logs.contains("rank=1"));
    assert!(logs.contains("rank=4"));
    assert!(logs.contains("scope=user-category"));
    assert!(logs.contains("scope=org-wide"));
}

#[test]
fn foreign_policies_from_store_are_logged_not_filtered() {
    let fx = Fixture::new();
    let acme_default = Policy::builder()
        .id(PolicyId::new("acme-default").unwrap())
        .org(acme())
        .max_amount(dec!(100))
        .build()
        .unwrap();
    let globex_default = Policy::builder()
        .id(PolicyId::new("globex-default").unwrap())
        .org(globex())
        .max_amount(dec!(5000))
        .build()
        .unwrap();
    let store = Arc::new(UnscopedStore(vec![acme_default, globex_default]));
    let engine: PolicyEngine = PolicyEngine::new(store, fx.directory.clone());
    let query = ResolveQuery::parse("alice", None).unwrap();

    let (resolution, logs) = with_captured_logs(|| engine.resolve(&acme(), &query).unwrap());

    let ids: Vec<&str> = resolution
        .applicable_policies
        .iter()
        .map(|a| a.policy.id.as_str())
        .collect();
    assert_eq!(ids, vec!["acme-default", "globex-default"]);
    assert_eq!(resolution.winner().unwrap().policy.id.as_str(), "acme-default");

    assert!(logs.contains("WARN"));
    assert!(logs.contains("store returned policies owned by another organization"));
    assert!(logs.contains("foreign=1"));
}
