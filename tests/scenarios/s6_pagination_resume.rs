use crate::common::{harness, inbound, no_metadata};

#[tokio::test]
async fn pagination_resumes_across_pages() {
    let h = harness();
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();

    let message_ids = ["m1", "m2", "m3", "m4", "m5"];
    for (index, message_id) in message_ids.iter().enumerate() {
        let timestamp = format!("2014-01-01 00:00:{:02}.000", index);
        let msg = inbound(message_id, &timestamp, "+111");
        h.operational.add_inbound_message(msg, &[batch_id.clone()]).await.unwrap();
    }

    let page1 = h.query.list_batch_inbound_keys(&batch_id, Some(3)).await.unwrap();
    assert_eq!(page1.keys().len(), 3);
    assert!(page1.has_next());

    let page2 = page1.next_page().await.unwrap();
    assert_eq!(page2.keys().len(), 2);
    assert!(!page2.has_next());

    let mut all: Vec<String> = page1.keys().into_iter().map(str::to_owned).collect();
    all.extend(page2.keys().into_iter().map(str::to_owned));
    all.sort();
    assert_eq!(all, message_ids.iter().map(|id| (*id).to_owned()).collect::<Vec<_>>());
}
