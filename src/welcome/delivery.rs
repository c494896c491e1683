//! Sequential best-effort delivery of welcome fragments.

use tracing::{error, info};

use super::MessageSender;
use crate::error::ApiError;
use crate::onebot::message::Fragment;

/// What happened to each fragment of one welcome.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Number of fragments sent successfully.
    pub sent: usize,
    /// Index and error of each fragment that failed.
    pub failed: Vec<(usize, ApiError)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.sent + self.failed.len()
    }
}

/// Send fragments to a group one after another.
///
/// A failed fragment is logged and skipped; the rest are still sent.
pub async fn deliver(
    sender: &dyn MessageSender,
    group_id: i64,
    fragments: &[Fragment],
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for (index, fragment) in fragments.iter().enumerate() {
        match sender.send_group_message(group_id, fragment).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                error!(
                    "Failed to send welcome segment {}/{} to group {}: {}",
                    index + 1,
                    fragments.len(),
                    group_id,
                    e
                );
                report.failed.push((index, e));
            }
        }
    }

    info!(
        "Sent welcome message to group {} ({} of {} segments)",
        group_id,
        report.sent,
        fragments.len()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onebot::message::Part;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records sends and fails the fragment indices listed in `fail_on`.
    struct RecordingSender {
        fail_on: Vec<usize>,
        sent: Mutex<Vec<(i64, Vec<Part>)>>,
        calls: Mutex<usize>,
    }

    impl RecordingSender {
        fn new(fail_on: Vec<usize>) -> Self {
            Self {
                fail_on,
                sent: Mutex::new(vec![]),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send_group_message(&self, group_id: i64, fragment: &[Part]) -> Result<(), ApiError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls - 1
            };

            if self.fail_on.contains(&call) {
                return Err(ApiError::Retcode {
                    action: "send_group_msg",
                    retcode: 1200,
                    message: "rate limited".to_string(),
                });
            }

            self.sent.lock().unwrap().push((group_id, fragment.to_vec()));
            Ok(())
        }
    }

    fn fragments() -> Vec<Fragment> {
        vec![
            vec![Part::text("one")],
            vec![Part::text("two"), Part::Mention(5)],
            vec![Part::text("three")],
        ]
    }

    #[tokio::test]
    async fn test_delivers_in_order() {
        let sender = RecordingSender::new(vec![]);
        let report = deliver(&sender, 100, &fragments()).await;

        assert!(report.is_complete());
        assert_eq!(report.sent, 3);

        let sent = sender.sent.lock().unwrap();
        let texts: Vec<&Part> = sent.iter().map(|(_, f)| &f[0]).collect();
        assert_eq!(
            texts,
            vec![&Part::text("one"), &Part::text("two"), &Part::text("three")]
        );
        assert!(sent.iter().all(|(group_id, _)| *group_id == 100));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_fragments() {
        let sender = RecordingSender::new(vec![1]);
        let report = deliver(&sender, 100, &fragments()).await;

        assert!(!report.is_complete());
        assert_eq!(report.sent, 2);
        assert_eq!(report.total(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 1);

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].1, vec![Part::text("one")]);
        assert_eq!(sent[1].1, vec![Part::text("three")]);
    }

    #[tokio::test]
    async fn test_nothing_to_deliver() {
        let sender = RecordingSender::new(vec![]);
        let report = deliver(&sender, 100, &[]).await;

        assert_eq!(report.total(), 0);
        assert!(report.is_complete());
    }
}
