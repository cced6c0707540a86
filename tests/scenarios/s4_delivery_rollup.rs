use message_store::model::DeliveryStatus;

use crate::common::{ack, delivery_report, harness, no_metadata, outbound};

#[tokio::test]
async fn delivery_report_rollup() {
    let h = harness();
    let batch_id = h.batch_manager.batch_start(Vec::new(), no_metadata()).await.unwrap();

    let m = outbound("m", "2014-01-01 00:00:00.000", "+111");
    h.operational.add_outbound_message(m, &[batch_id.clone()]).await.unwrap();

    let ack_event = ack("e0", "m", "2014-01-01 00:00:01.000");
    h.operational.add_event(ack_event, &[batch_id.clone()]).await.unwrap();

    for (index, second) in ["02", "03", "04"].into_iter().enumerate() {
        let event = delivery_report(
            &format!("e{}", index + 1),
            "m",
            &format!("2014-01-01 00:00:{second}.000"),
            DeliveryStatus::Delivered,
        );
        h.operational.add_event(event, &[batch_id.clone()]).await.unwrap();
    }

    let status = h.query.get_batch_status(&batch_id).await.unwrap();
    assert_eq!(status["ack"], 1);
    assert_eq!(status["delivery_report.delivered"], 3);
    assert_eq!(status["delivery_report"], 3);
}
