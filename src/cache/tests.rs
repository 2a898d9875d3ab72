use super::*;

use crate::pipeline::{ClaimVerdict, Verdict};

fn result(verdict: Verdict) -> Arc<ClassificationResult> {
    Arc::new(ClassificationResult {
        overall_classification: verdict,
        confidence: 0.9,
        claims: vec![ClaimVerdict {
            claim: "Albert Einstein was born in 1879.".to_string(),
            classification: verdict,
            confidence: 0.9,
            best_evidence: None,
        }],
    })
}

fn cache(ttl: Duration) -> ResultCache {
    ResultCache::new(100, ttl, NormalizationPolicy::Whitespace)
}

#[test]
fn test_miss_then_hit() {
    let cache = cache(Duration::from_secs(60));
    let text = "Albert Einstein was born in 1879.";

    assert!(cache.get(text).is_none());
    cache.put(text, result(Verdict::Truth));

    let hit = cache.get(text).unwrap();
    assert_eq!(hit.overall_classification, Verdict::Truth);

    let info = cache.info();
    assert_eq!(info.hits, 1);
    assert_eq!(info.misses, 1);
}

#[test]
fn test_hit_returns_identical_result() {
    let cache = cache(Duration::from_secs(60));
    let stored = result(Verdict::Falsehood);
    cache.put("text", Arc::clone(&stored));

    let first = serde_json::to_vec(&*cache.get("text").unwrap()).unwrap();
    let second = serde_json::to_vec(&*cache.get("text").unwrap()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, serde_json::to_vec(&*stored).unwrap());
}

#[test]
fn test_whitespace_normalization_shares_entries() {
    let cache = cache(Duration::from_secs(60));
    cache.put("Einstein  was\nborn.", result(Verdict::Truth));

    assert!(cache.get(" Einstein was born. ").is_some());
    assert!(cache.get("einstein was born.").is_none());
}

#[test]
fn test_exact_policy_distinguishes_whitespace() {
    let cache = ResultCache::new(100, Duration::from_secs(60), NormalizationPolicy::Exact);
    cache.put("Einstein  was born.", result(Verdict::Truth));

    assert!(cache.get("Einstein was born.").is_none());
}

#[test]
fn test_expired_entry_is_a_miss() {
    let cache = cache(Duration::from_millis(100));
    cache.put("text", result(Verdict::Truth));
    assert!(cache.get("text").is_some());

    std::thread::sleep(Duration::from_millis(250));

    assert!(cache.get("text").is_none());
    cache.run_pending_tasks();
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_last_write_wins() {
    let cache = cache(Duration::from_secs(60));
    cache.put("text", result(Verdict::Truth));
    cache.put("text", result(Verdict::Neutral));

    assert_eq!(
        cache.get("text").unwrap().overall_classification,
        Verdict::Neutral
    );
}

#[test]
fn test_invalidate_and_clear() {
    let cache = cache(Duration::from_secs(60));
    cache.put("a", result(Verdict::Truth));
    cache.put("b", result(Verdict::Truth));

    cache.invalidate("a");
    assert!(cache.get("a").is_none());
    assert!(cache.get("b").is_some());

    cache.clear();
    assert!(cache.get("b").is_none());
}

#[test]
fn test_info_reports_configuration() {
    let cache = ResultCache::new(42, Duration::from_secs(300), NormalizationPolicy::Casefold);
    cache.put("a", result(Verdict::Truth));
    cache.run_pending_tasks();

    let info = cache.info();
    assert_eq!(info.entries, 1);
    assert_eq!(info.ttl_secs, 300);
    assert_eq!(info.capacity, 42);
    assert_eq!(info.normalization, NormalizationPolicy::Casefold);
}

#[test]
fn test_cache_status_header_values() {
    assert_eq!(CacheStatus::Hit.as_header_value(), "HIT");
    assert_eq!(CacheStatus::Miss.to_string(), "MISS");
    assert!(CacheStatus::Hit.is_hit());
    assert!(!CacheStatus::Miss.is_hit());
}
