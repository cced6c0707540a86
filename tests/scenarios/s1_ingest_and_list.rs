use crate::common::{harness, inbound, no_metadata};

#[tokio::test]
async fn ingest_and_list() {
    let h = harness();

    let batch_id = h
        .batch_manager
        .batch_start(vec!["size:large".to_owned()], no_metadata())
        .await
        .unwrap();

    let m1 = inbound("m1", "2014-01-01 00:00:00.000", "+111");
    let m2 = inbound("m2", "2014-01-01 00:00:01.000", "+222");
    h.operational.add_inbound_message(m1.clone(), &[batch_id.clone()]).await.unwrap();
    h.operational.add_inbound_message(m2.clone(), &[batch_id.clone()]).await.unwrap();

    let fetched = h.query.get_inbound_message("m1").await.unwrap().unwrap();
    assert_eq!(fetched, m1);

    let page = h
        .query
        .list_batch_inbound_keys_with_timestamps(&batch_id, None, None, None)
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    let pairs: Vec<_> = page
        .into_iter()
        .map(|item| (item.key, item.term.and_then(|term| term.split('$').nth(1).map(str::to_owned)).unwrap()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("m1".to_owned(), "2014-01-01 00:00:00.000".to_owned()),
            ("m2".to_owned(), "2014-01-01 00:00:01.000".to_owned()),
        ]
    );
}
