//! Shared customer check record.
//!
//! Tasks merge their extracted fields concurrently; once all tasks have
//! finished, [`Aggregator::finalize`] runs the cross-document address check.

mod address;

use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::analysis::{AddressComparator, Extraction, FieldMap};
use crate::models::{CustomerCheck, DocumentKind, YesNo};

pub use address::{addresses_match, normalize_address};

/// Upper bound for the AI address comparison.
pub const ADDRESS_COMPARISON_TIMEOUT: Duration = Duration::from_secs(60);

/// How `billing_address_matches_client` was decided during finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressCheck {
    /// Decided by the address comparator.
    Semantic(YesNo),
    /// Comparator failed; decided by [`addresses_match`].
    Fallback { verdict: YesNo, reason: String },
    /// One of the addresses is missing; the field was left as is.
    Skipped,
}

impl AddressCheck {
    pub fn verdict(&self) -> Option<YesNo> {
        match self {
            Self::Semantic(v) | Self::Fallback { verdict: v, .. } => Some(*v),
            Self::Skipped => None,
        }
    }
}

fn yes_no(matches: bool) -> YesNo {
    if matches {
        YesNo::Yes
    } else {
        YesNo::No
    }
}

/// Thread-safe owner of the batch's [`CustomerCheck`].
pub struct Aggregator {
    record: Mutex<CustomerCheck>,
    comparison_timeout: Duration,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Empty record stamped with the current time.
    pub fn new() -> Self {
        Self::with_record(CustomerCheck::started_at(Utc::now()))
    }

    pub fn with_record(record: CustomerCheck) -> Self {
        Self {
            record: Mutex::new(record),
            comparison_timeout: ADDRESS_COMPARISON_TIMEOUT,
        }
    }

    pub fn with_comparison_timeout(mut self, timeout: Duration) -> Self {
        self.comparison_timeout = timeout;
        self
    }

    /// Merge the fields extracted from one document.
    ///
    /// Conversion happens before the lock is taken; the lock only covers
    /// the in-memory assignment.
    pub async fn merge(&self, kind: DocumentKind, fields: &FieldMap) {
        let extraction = Extraction::from_fields(kind, fields);
        if let Extraction::Unmapped(kind) = &extraction {
            debug!("No record section for {}, fields not merged", kind);
            return;
        }

        let mut record = self.record.lock().await;
        extraction.apply_to(&mut record);
    }

    /// Copy of the current record.
    pub async fn snapshot(&self) -> CustomerCheck {
        self.record.lock().await.clone()
    }

    /// Cross-check the billing address against the business address.
    ///
    /// The computed verdict replaces whatever the EVN bill extraction put in
    /// `billing_address_matches_client`.
    pub async fn finalize(&self, comparator: &dyn AddressComparator) -> AddressCheck {
        let (business, billing) = {
            let record = self.record.lock().await;
            (
                record.corporate.general.business_address.clone(),
                record.land.evn.billing_address.clone(),
            )
        };

        if business.trim().is_empty() || billing.trim().is_empty() {
            info!(
                "Cannot compare addresses, missing data (business: {:?}, billing: {:?})",
                business, billing
            );
            return AddressCheck::Skipped;
        }

        info!("Comparing addresses: {:?} vs {:?}", business, billing);
        let outcome = match tokio::time::timeout(
            self.comparison_timeout,
            comparator.same_location(&business, &billing),
        )
        .await
        {
            Ok(Ok(matches)) => AddressCheck::Semantic(yes_no(matches)),
            Ok(Err(e)) => Self::fallback(&business, &billing, e.to_string()),
            Err(_) => Self::fallback(
                &business,
                &billing,
                format!("timed out after {:?}", self.comparison_timeout),
            ),
        };

        if let Some(verdict) = outcome.verdict() {
            info!("Billing address matches client: {}", verdict);
            self.record.lock().await.land.evn.billing_address_matches_client = Some(verdict);
        }
        outcome
    }

    fn fallback(business: &str, billing: &str, reason: String) -> AddressCheck {
        warn!("AI address comparison failed, using fallback: {}", reason);
        AddressCheck::Fallback {
            verdict: yes_no(addresses_match(business, billing)),
            reason,
        }
    }

    pub fn into_record(self) -> CustomerCheck {
        self.record.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Verdict {
        Answer(bool),
        Fail,
        Hang,
    }

    struct FixedComparator {
        verdict: Verdict,
        calls: AtomicUsize,
    }

    impl FixedComparator {
        fn new(verdict: Verdict) -> Self {
            Self {
                verdict,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AddressComparator for FixedComparator {
        async fn same_location(&self, _a: &str, _b: &str) -> Result<bool, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.verdict {
                Verdict::Answer(v) => Ok(v),
                Verdict::Fail => Err(AnalysisError::EmptyResponse),
                Verdict::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(true)
                }
            }
        }
    }

    fn fields(value: serde_json::Value) -> FieldMap {
        value.as_object().cloned().unwrap()
    }

    async fn with_addresses(business: &str, billing: &str, ai_says: &str) -> Aggregator {
        let aggregator = Aggregator::new();
        aggregator
            .merge(
                DocumentKind::BusinessLicense,
                &fields(json!({"business_address": business})),
            )
            .await;
        aggregator
            .merge(
                DocumentKind::EvnBill,
                &fields(json!({
                    "billing_address": billing,
                    "billing_address_matches_client": ai_says
                })),
            )
            .await;
        aggregator
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_merges_lose_nothing() {
        let aggregator = Arc::new(Aggregator::new());

        let mut handles = Vec::new();
        for i in 0..32i64 {
            let aggregator = aggregator.clone();
            handles.push(tokio::spawn(async move {
                let loan = json!({"loans": [{"outstanding_amount": i + 1}]});
                aggregator.merge(DocumentKind::CicReport, &fields(loan)).await;
            }));
        }
        for (kind, value) in [
            (DocumentKind::BusinessLicense, json!({"client_name": "ABC"})),
            (DocumentKind::IdCheck, json!({"company_director_name": "B"})),
            (DocumentKind::EvnBill, json!({"billing_amount": 10})),
            (
                DocumentKind::SiteVisitPhotos,
                json!({"company_signboard": "not_available_or_not_checked"}),
            ),
        ] {
            let aggregator = aggregator.clone();
            handles.push(tokio::spawn(async move {
                aggregator.merge(kind, &fields(value)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = aggregator.snapshot().await;
        assert_eq!(record.financial.loans.len(), 32);
        let total: i64 = record.financial.loans.iter().map(|l| l.outstanding_amount).sum();
        assert_eq!(total, (1..=32).sum::<i64>());
        assert_eq!(record.corporate.general.client_name, "ABC");
        assert_eq!(record.corporate.ownership.company_director_name, "B");
        assert_eq!(record.land.evn.billing_amount, Some(10));
        assert!(record.additional.site_visit.company_signboard.is_some());
    }

    #[tokio::test]
    async fn test_comparator_verdict_overrides_extracted_flag() {
        let aggregator = with_addresses("12 Le Loi, District 1", "12 Le Loi St, Dist 1", "yes").await;
        let comparator = FixedComparator::new(Verdict::Answer(false));

        let outcome = aggregator.finalize(&comparator).await;
        assert_eq!(outcome, AddressCheck::Semantic(YesNo::No));
        let record = aggregator.into_record();
        assert_eq!(record.land.evn.billing_address_matches_client, Some(YesNo::No));
    }

    #[tokio::test]
    async fn test_comparator_failure_uses_fallback() {
        let aggregator = with_addresses(
            "123 Main Street, District 1, Ho Chi Minh City",
            "123 Main St, Dist 1, HCMC",
            "no",
        )
        .await;
        let comparator = FixedComparator::new(Verdict::Fail);

        let outcome = aggregator.finalize(&comparator).await;
        assert!(matches!(outcome, AddressCheck::Fallback { verdict: YesNo::Yes, .. }));
        assert_eq!(
            aggregator.snapshot().await.land.evn.billing_address_matches_client,
            Some(YesNo::Yes)
        );
    }

    #[tokio::test]
    async fn test_slow_comparator_times_out_to_fallback() {
        let aggregator = with_addresses("1 Hai Ba Trung, Hanoi", "99 Nguyen Trai, Da Nang", "yes")
            .await
            .with_comparison_timeout(Duration::from_millis(50));
        let comparator = FixedComparator::new(Verdict::Hang);

        let outcome = aggregator.finalize(&comparator).await;
        match outcome {
            AddressCheck::Fallback { verdict, reason } => {
                assert_eq!(verdict, YesNo::No);
                assert!(reason.contains("timed out"));
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_address_skips_comparison() {
        let aggregator = Aggregator::new();
        aggregator
            .merge(
                DocumentKind::EvnBill,
                &fields(json!({"billing_address": "1 Le Loi", "billing_address_matches_client": "yes"})),
            )
            .await;
        let comparator = FixedComparator::new(Verdict::Answer(false));

        assert_eq!(aggregator.finalize(&comparator).await, AddressCheck::Skipped);
        assert_eq!(comparator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            aggregator.snapshot().await.land.evn.billing_address_matches_client,
            Some(YesNo::Yes)
        );
    }

    #[tokio::test]
    async fn test_unmapped_kind_is_ignored() {
        let aggregator = Aggregator::with_record(CustomerCheck::default());
        aggregator
            .merge(DocumentKind::Unknown, &fields(json!({"client_name": "X"})))
            .await;
        assert_eq!(aggregator.into_record(), CustomerCheck::default());
    }
}
