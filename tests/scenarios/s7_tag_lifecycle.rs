use message_store::model::CurrentTag;

use crate::common::{harness, no_metadata};

#[tokio::test]
async fn get_tag_info_never_persists_an_unknown_tag() {
    let h = harness();

    let first = h.batch_manager.get_tag_info("sms:inbound").await.unwrap();
    let second = h.batch_manager.get_tag_info("sms:inbound").await.unwrap();

    let fresh = CurrentTag::new("sms:inbound".to_owned());
    assert_eq!(first, fresh);
    assert_eq!(second, fresh);
    assert!(first.current_batch.is_none());
}

#[tokio::test]
async fn batch_done_clears_the_current_tag_pointer() {
    let h = harness();
    let batch_id = h
        .batch_manager
        .batch_start(vec!["sms:inbound".to_owned()], no_metadata())
        .await
        .unwrap();

    let during = h.batch_manager.get_tag_info("sms:inbound").await.unwrap();
    assert_eq!(during.current_batch.as_deref(), Some(batch_id.as_str()));

    h.batch_manager.batch_done(&batch_id).await.unwrap();

    let after = h.batch_manager.get_tag_info("sms:inbound").await.unwrap();
    assert!(after.current_batch.is_none());

    // The Batch record itself is untouched.
    let batch = h.batch_manager.get_batch(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.tags, vec!["sms:inbound".to_owned()]);
}

#[tokio::test]
async fn batch_done_on_unknown_batch_is_a_no_op() {
    let h = harness();
    h.batch_manager.batch_done("no-such-batch").await.unwrap();
}
