use crate::common::{harness, harness_with_recency_limit, inbound, no_metadata};

/// §8 property 1 — idempotence of writes.
#[tokio::test]
async fn idempotent_inbound_write() {
    let h = harness();
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();
    let msg = inbound("m1", "2014-01-01 00:00:00.000", "+111");

    h.operational.add_inbound_message(msg.clone(), &[batch_id.clone()]).await.unwrap();
    h.operational.add_inbound_message(msg, &[batch_id.clone()]).await.unwrap();

    let record = h.backend.get_raw_inbound_message("m1").await.unwrap().unwrap();
    assert_eq!(record.batches.len(), 1);
    assert_eq!(h.query.get_batch_inbound_count(&batch_id).await.unwrap(), 1);
}

/// §8 property 2 — monotone batch association.
#[tokio::test]
async fn batch_associations_only_grow() {
    let h = harness();
    let b1 = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();
    let b2 = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();
    let msg = inbound("m1", "2014-01-01 00:00:00.000", "+111");

    h.operational.add_inbound_message(msg.clone(), &[b1.clone()]).await.unwrap();
    h.operational.add_inbound_message(msg, &[b2.clone()]).await.unwrap();

    let record = h.backend.get_raw_inbound_message("m1").await.unwrap().unwrap();
    assert!(record.batches.contains(&b1));
    assert!(record.batches.contains(&b2));
    assert_eq!(record.batches.len(), 2);
}

/// §8 property 3 — index-term well-formedness: one `batches_with_timestamps`
/// entry per (message, batch) pair, encoding exactly `batch_id$timestamp`.
#[tokio::test]
async fn index_terms_are_well_formed() {
    let h = harness();
    let b1 = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();
    let b2 = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();
    let msg = inbound("m1", "2014-01-01 00:00:00.000", "+111");

    h.operational.add_inbound_message(msg.clone(), &[b1.clone(), b2.clone()]).await.unwrap();

    for batch_id in [&b1, &b2] {
        let entries = h
            .query
            .list_batch_inbound_keys_with_timestamps(batch_id, None, None, None)
            .await
            .unwrap()
            .collect_all()
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].term.as_deref(), Some(format!("{batch_id}$2014-01-01 00:00:00.000").as_str()));
    }
}

/// §8 property 4 — range-scan completeness: concatenating all pages equals
/// the full associated set, in ascending timestamp order.
#[tokio::test]
async fn range_scan_is_complete_and_ordered() {
    let h = harness();
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();
    for index in 0..7 {
        let timestamp = format!("2014-01-01 00:00:{index:02}.000");
        let msg = inbound(&format!("m{index}"), &timestamp, "+111");
        h.operational.add_inbound_message(msg, &[batch_id.clone()]).await.unwrap();
    }

    let page = h.query.list_batch_inbound_keys_with_timestamps(&batch_id, None, None, Some(2)).await.unwrap();
    let all = page.collect_all().await.unwrap();
    let keys: Vec<_> = all.iter().map(|item| item.key.clone()).collect();
    assert_eq!(keys, (0..7).map(|index| format!("m{index}")).collect::<Vec<_>>());
}

/// §8 property 5 — pagination round-trip: any page size yields the same
/// ordered sequence as one giant page.
#[tokio::test]
async fn pagination_round_trip_is_page_size_independent() {
    let h = harness();
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();
    for index in 0..6 {
        let timestamp = format!("2014-01-01 00:00:{index:02}.000");
        let msg = inbound(&format!("m{index}"), &timestamp, "+111");
        h.operational.add_inbound_message(msg, &[batch_id.clone()]).await.unwrap();
    }

    let one_giant_page = h
        .query
        .list_batch_inbound_keys_with_timestamps(&batch_id, None, None, Some(100))
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    let small_pages = h
        .query
        .list_batch_inbound_keys_with_timestamps(&batch_id, None, None, Some(1))
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    let giant_keys: Vec<_> = one_giant_page.iter().map(|item| item.key.clone()).collect();
    let small_keys: Vec<_> = small_pages.iter().map(|item| item.key.clone()).collect();
    assert_eq!(giant_keys, small_keys);
}

/// §8 property 6 — cache counter correctness under duplicate and
/// cross-batch writes.
#[tokio::test]
async fn cache_counters_match_distinct_message_ids() {
    let h = harness();
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();

    for _ in 0..3 {
        let msg = inbound("m1", "2014-01-01 00:00:00.000", "+111");
        h.operational.add_inbound_message(msg, &[batch_id.clone()]).await.unwrap();
    }
    let msg2 = inbound("m2", "2014-01-01 00:00:01.000", "+111");
    h.operational.add_inbound_message(msg2, &[batch_id.clone()]).await.unwrap();

    assert_eq!(h.query.get_batch_inbound_count(&batch_id).await.unwrap(), 2);
}

/// §8 property 7 — recency bound: at most T entries, always the T most
/// recent.
#[tokio::test]
async fn recency_set_never_exceeds_t() {
    let h = harness_with_recency_limit(3);
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();

    for index in 0..10 {
        let timestamp = format!("2014-01-01 00:00:{index:02}.000");
        let msg = inbound(&format!("m{index}"), &timestamp, "+111");
        h.operational.add_inbound_message(msg, &[batch_id.clone()]).await.unwrap();
    }

    let recent = h.query.list_recent_inbound_message_keys(&batch_id).await.unwrap();
    assert_eq!(recent, vec!["m9".to_owned(), "m8".to_owned(), "m7".to_owned()]);
}

/// §8 property 8 — rollup: each delivery report increases both its own
/// sub-status bucket and the rolled-up `delivery_report` bucket by
/// exactly 1.
#[tokio::test]
async fn each_delivery_report_increments_both_buckets() {
    use message_store::model::DeliveryStatus;

    let h = harness();
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();
    let msg = crate::common::outbound("m", "2014-01-01 00:00:00.000", "+111");
    h.operational.add_outbound_message(msg, &[batch_id.clone()]).await.unwrap();

    let before = h.query.get_batch_status(&batch_id).await.unwrap();
    let event = crate::common::delivery_report("e1", "m", "2014-01-01 00:00:01.000", DeliveryStatus::Failed);
    h.operational.add_event(event, &[batch_id.clone()]).await.unwrap();
    let after = h.query.get_batch_status(&batch_id).await.unwrap();

    assert_eq!(after["delivery_report.failed"] - before.get("delivery_report.failed").copied().unwrap_or(0), 1);
    assert_eq!(after["delivery_report"] - before.get("delivery_report").copied().unwrap_or(0), 1);
}
