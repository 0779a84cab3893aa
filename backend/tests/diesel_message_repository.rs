//! `DieselMessageRepository` against embedded PostgreSQL.
//!
//! Broadcasts write the message and its receipts in one transaction, so an
//! unusable recipient must leave both tables untouched.

use gymdesk::domain::ports::{MessagePersistenceError, MessageRepository};
use gymdesk::domain::{AnnouncementText, BroadcastAudience, IdentityId};
use gymdesk::outbound::persistence::{DbPool, DieselMessageRepository, PoolConfig};
use pg_embedded_setup_unpriv::TestCluster;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

use embedded_postgres::{
    deactivate_identity, handle_cluster_setup_failure, migrated_database, scalar, seed_identity,
    test_cluster,
};

const TEST_DB: &str = "gymdesk_message_repo_test";

struct TestContext {
    runtime: Runtime,
    repository: DieselMessageRepository,
    url: String,
    members: Vec<IdentityId>,
    _cluster: TestCluster,
}

impl TestContext {
    fn rows(&self, table: &str) -> i64 {
        scalar(&self.url, &format!("SELECT count(*) FROM {table}"), &[]).expect("count rows")
    }

    fn deactivate(&self, member: IdentityId) {
        deactivate_identity(&self.url, member.get()).expect("deactivate member");
    }
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let url = migrated_database(&cluster, TEST_DB)?;

    let members = ["ada@gym.example", "grace@gym.example", "linus@gym.example"]
        .into_iter()
        .map(|email| {
            let id = seed_identity(&url, email)?;
            IdentityId::new(id).map_err(|err| err.to_string())
        })
        .collect::<Result<Vec<_>, String>>()?;

    let config = PoolConfig::new(&url).with_max_size(2);
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        repository: DieselMessageRepository::new(pool),
        url,
        members,
        _cluster: cluster,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn text(body: &str) -> AnnouncementText {
    AnnouncementText::new(body).expect("valid announcement")
}

#[rstest]
fn broadcast_to_all_skips_deactivated_identities(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: broadcast_to_all_skips_deactivated_identities skipped");
        return;
    };
    let repository = context.repository.clone();
    let departed = context.members[2];
    context.deactivate(departed);

    let receipt = context
        .runtime
        .block_on(repository.create_broadcast(&text("Pool closed"), &BroadcastAudience::AllActive))
        .expect("broadcast");

    assert_eq!(receipt.recipient_count, 2);
    assert_eq!(context.rows("message_reads"), 2);

    let inbox = context
        .runtime
        .block_on(repository.list_for_recipient(context.members[0]))
        .expect("inbox");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].id, receipt.message_id);
    assert_eq!(inbox[0].body, "Pool closed");
    assert!(!inbox[0].read);

    let departed_inbox = context
        .runtime
        .block_on(repository.list_for_recipient(departed))
        .expect("departed inbox");
    assert!(departed_inbox.is_empty());
}

#[rstest]
#[case::deactivated(true)]
#[case::never_existed(false)]
fn unusable_explicit_recipient_rolls_back_the_broadcast(
    repo_context: Option<TestContext>,
    #[case] deactivated: bool,
) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: unusable_explicit_recipient_rolls_back_the_broadcast skipped");
        return;
    };
    let repository = context.repository.clone();
    let unusable = if deactivated {
        context.deactivate(context.members[1]);
        context.members[1]
    } else {
        IdentityId::new(9_999).expect("identity id")
    };
    let audience =
        BroadcastAudience::explicit([context.members[0], unusable]).expect("explicit audience");

    let err = context
        .runtime
        .block_on(repository.create_broadcast(&text("Sauna maintenance"), &audience))
        .expect_err("broadcast must fail");

    assert_eq!(err, MessagePersistenceError::unknown_recipient());
    assert_eq!(context.rows("messages"), 0);
    assert_eq!(context.rows("message_reads"), 0);
}

#[rstest]
fn read_flags_are_idempotent_and_counted(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: read_flags_are_idempotent_and_counted skipped");
        return;
    };
    let repository = context.repository.clone();
    let reader = context.members[0];
    let audience =
        BroadcastAudience::explicit([reader, context.members[1]]).expect("explicit audience");

    let first = context
        .runtime
        .block_on(repository.create_broadcast(&text("Yoga moved to 6pm"), &audience))
        .expect("first broadcast");
    context
        .runtime
        .block_on(repository.create_broadcast(&text("New kettlebells"), &audience))
        .expect("second broadcast");

    for _ in 0..2 {
        context
            .runtime
            .block_on(repository.mark_read(reader, first.message_id))
            .expect("mark read");
    }

    let summaries = context
        .runtime
        .block_on(repository.list_all())
        .expect("list all");
    let first_summary = summaries
        .iter()
        .find(|summary| summary.id == first.message_id)
        .expect("first summary");
    assert_eq!(summaries.len(), 2);
    assert_eq!(first_summary.recipient_count, 2);
    assert_eq!(first_summary.read_count, 1);

    let changed = context
        .runtime
        .block_on(repository.mark_all_read(reader))
        .expect("mark all read");
    let changed_again = context
        .runtime
        .block_on(repository.mark_all_read(reader))
        .expect("mark all read again");
    assert_eq!(changed, 1);
    assert_eq!(changed_again, 0);

    let inbox = context
        .runtime
        .block_on(repository.list_for_recipient(reader))
        .expect("inbox");
    assert!(inbox.iter().all(|entry| entry.read));
}
