use std::collections::BTreeSet;

use crate::common::{harness, inbound, no_metadata};

#[tokio::test]
async fn rebatch_unions_associations_and_indexes() {
    let h = harness();

    let b1 = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();
    let b2 = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();

    let m1 = inbound("m1", "2014-01-01 00:00:00.000", "+111");
    h.operational.add_inbound_message(m1.clone(), &[b1.clone()]).await.unwrap();
    h.operational.add_inbound_message(m1, &[b2.clone()]).await.unwrap();

    let raw = h.backend.get_raw_inbound_message("m1").await.unwrap().unwrap();
    assert_eq!(raw.batches, BTreeSet::from([b1.clone(), b2.clone()]));

    let keys_b2 = h
        .query
        .list_batch_inbound_keys(&b2, None)
        .await
        .unwrap()
        .keys()
        .into_iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    assert_eq!(keys_b2, vec!["m1".to_owned()]);

    let timestamp_entries_b1 = h
        .query
        .list_batch_inbound_keys_with_timestamps(&b1, None, None, None)
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(timestamp_entries_b1.len(), 1);
    let timestamp_entries_b2 = h
        .query
        .list_batch_inbound_keys_with_timestamps(&b2, None, None, None)
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(timestamp_entries_b2.len(), 1);
}
