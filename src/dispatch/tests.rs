use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::embedding::{EntailmentModel, ScriptedEncoder, ScriptedEntailment, distribution};
use crate::hashing::NormalizationPolicy;
use crate::index::{KnowledgeBase, KnowledgeBaseEntry, Neighbor, ScriptedIndex};
use crate::models::ModelManager;
use crate::pipeline::{PipelineError, PipelineOptions, Verdict};

struct Fixture {
    dispatcher: Dispatcher,
    nli: Arc<ScriptedEntailment>,
    encoder: Arc<ScriptedEncoder>,
}

fn fixture(nli: ScriptedEntailment, timeout: Duration) -> Fixture {
    let nli = Arc::new(nli);
    let encoder = Arc::new(ScriptedEncoder::new(2));
    let models = ModelManager::from_parts(
        Arc::clone(&encoder) as Arc<dyn crate::embedding::TextEncoder>,
        Arc::clone(&nli) as Arc<dyn EntailmentModel>,
        Arc::new(ScriptedIndex::new(2, 1, vec![Neighbor { score: 0.9, id: 0 }])),
        Arc::new(KnowledgeBase::new(vec![KnowledgeBaseEntry::new(
            "Albert Einstein was born on 14 March 1879.",
            "Albert_Einstein",
        )])),
    )
    .unwrap();

    let classifier = Arc::new(ClaimClassifier::new(
        Arc::new(models),
        PipelineOptions::default(),
    ));
    let cache = Arc::new(ResultCache::new(
        100,
        Duration::from_secs(60),
        NormalizationPolicy::Whitespace,
    ));

    Fixture {
        dispatcher: Dispatcher::new(classifier, cache, InferencePool::new(1, timeout), 200),
        nli,
        encoder,
    }
}

fn supportive() -> ScriptedEntailment {
    ScriptedEntailment::new().with_default(distribution(0.95, 0.01, 0.04))
}

#[tokio::test]
async fn test_classify_then_cache_hit_skips_pipeline() {
    let f = fixture(supportive(), Duration::from_secs(5));
    let text = "Albert Einstein was born in 1879.";

    let first = f.dispatcher.classify(text).await.unwrap();
    assert_eq!(first.cache, CacheStatus::Miss);
    assert_eq!(first.result.overall_classification, Verdict::Truth);

    let nli_calls = f.nli.call_count();
    let encoder_calls = f.encoder.call_count();

    let second = f.dispatcher.classify(text).await.unwrap();
    assert_eq!(second.cache, CacheStatus::Hit);
    assert_eq!(
        serde_json::to_vec(&*first.result).unwrap(),
        serde_json::to_vec(&*second.result).unwrap()
    );
    assert_eq!(f.nli.call_count(), nli_calls);
    assert_eq!(f.encoder.call_count(), encoder_calls);
}

#[tokio::test]
async fn test_empty_input_never_reaches_pipeline() {
    let f = fixture(supportive(), Duration::from_secs(5));

    for text in ["", "   ", "\n\t"] {
        let err = f.dispatcher.classify(text).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidInput { .. }));
    }

    assert_eq!(f.encoder.call_count(), 0);
    assert_eq!(f.nli.call_count(), 0);
    assert_eq!(f.dispatcher.cache().info().misses, 0);
}

#[tokio::test]
async fn test_oversized_input_is_rejected() {
    let f = fixture(supportive(), Duration::from_secs(5));

    let err = f.dispatcher.classify(&"a".repeat(201)).await.unwrap_err();
    assert!(err.to_string().contains("limit is 200"));
    assert_eq!(f.encoder.call_count(), 0);
}

#[tokio::test]
async fn test_timeout_is_distinct_and_not_cached() {
    let nli = supportive().with_delay(Duration::from_millis(400));
    let f = fixture(nli, Duration::from_millis(100));
    let text = "Albert Einstein was born in 1879.";

    let err = f.dispatcher.classify(text).await.unwrap_err();
    assert!(matches!(err, DispatchError::Timeout { .. }));

    // Let the abandoned worker finish; it must not populate the cache.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(f.dispatcher.cache().get(text).is_none());
    assert_eq!(f.dispatcher.pool().available(), 1);
}

#[tokio::test]
async fn test_pipeline_errors_are_not_cached() {
    let nli = ScriptedEntailment::new().failing_on("born");
    let f = fixture(nli, Duration::from_secs(5));
    let text = "Albert Einstein was born in 1879.";

    let err = f.dispatcher.classify(text).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Pipeline(PipelineError::AllClaimsFailed { .. })
    ));
    assert!(f.dispatcher.cache().get(text).is_none());
}

#[tokio::test]
async fn test_pool_serializes_jobs() {
    let pool = InferencePool::new(1, Duration::from_secs(5));
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let jobs = (0..4).map(|_| {
        let active = Arc::clone(&active);
        let peak = Arc::clone(&peak);
        let pool = pool.clone();
        async move {
            pool.run(move |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(20));
                active.fetch_sub(1, Ordering::SeqCst);
            })
            .await
        }
    });

    for result in spawn_all(jobs).await {
        result.unwrap();
    }
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timeout_cancels_worker_token() {
    let pool = InferencePool::new(1, Duration::from_millis(50));
    let (tx, rx) = std::sync::mpsc::channel();

    let err = pool
        .run(move |token: &CancellationToken| {
            for _ in 0..200 {
                if token.is_cancelled() {
                    let _ = tx.send(true);
                    return;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            let _ = tx.send(false);
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Timeout { .. }));
    let observed = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(2)))
        .await
        .unwrap()
        .unwrap();
    assert!(observed);
}

#[tokio::test]
async fn test_queued_job_times_out_while_waiting() {
    let pool = InferencePool::new(1, Duration::from_millis(100));

    let busy = {
        let pool = pool.clone();
        tokio::spawn(async move {
            pool.run(|_| std::thread::sleep(Duration::from_millis(300))).await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let queued = pool.run(|_| ()).await;
    assert!(matches!(queued, Err(DispatchError::Timeout { .. })));

    let _ = busy.await.unwrap();
}

#[tokio::test]
async fn test_worker_panic_is_reported() {
    let pool = InferencePool::new(1, Duration::from_secs(5));
    let err = pool
        .run(|_: &CancellationToken| -> u32 { panic!("model exploded") })
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::WorkerFailed { .. }));
    assert_eq!(pool.available(), 1);
}

/// Spawns every future and collects the outputs in order.
async fn spawn_all<F: std::future::Future>(futures: impl Iterator<Item = F>) -> Vec<F::Output>
where
    F: Send + 'static,
    F::Output: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.expect("task panicked"));
    }
    out
}
