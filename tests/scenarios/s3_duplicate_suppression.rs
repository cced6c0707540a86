use crate::common::{harness, no_metadata, outbound};

#[tokio::test]
async fn duplicate_outbound_writes_count_once() {
    let h = harness();
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();

    let m = outbound("m", "2014-01-01 00:00:00.000", "+111");
    h.operational.add_outbound_message(m.clone(), &[batch_id.clone()]).await.unwrap();
    h.operational.add_outbound_message(m, &[batch_id.clone()]).await.unwrap();

    assert_eq!(h.query.get_batch_outbound_count(&batch_id).await.unwrap(), 1);
    let status = h.query.get_batch_status(&batch_id).await.unwrap();
    assert_eq!(status["sent"], 1);
}
