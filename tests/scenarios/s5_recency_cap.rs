use crate::common::{harness_with_recency_limit, no_metadata, outbound};

#[tokio::test]
async fn recency_set_keeps_only_the_most_recent_t() {
    let h = harness_with_recency_limit(2);
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();

    for (message_id, timestamp) in [
        ("m1", "2014-01-01 00:00:00.000"),
        ("m2", "2014-01-01 00:00:01.000"),
        ("m3", "2014-01-01 00:00:02.000"),
    ] {
        let msg = outbound(message_id, timestamp, "+111");
        h.operational.add_outbound_message(msg, &[batch_id.clone()]).await.unwrap();
    }

    let recent = h.query.list_recent_outbound_message_keys(&batch_id).await.unwrap();
    assert_eq!(recent, vec!["m3".to_owned(), "m2".to_owned()]);
}
