//! Tests for quota-driven region rotation.

use pictor_error::ProviderError;
use pictor_retry::{RegionRotationConfig, RegionRotator, RetryExecutor, RetryOptions, RetrySetting};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn rotation(candidates: &[&str], fallback: &str, always_try_fallback: bool) -> RegionRotationConfig {
    RegionRotationConfig {
        candidates: candidates.iter().map(|region| region.to_string()).collect(),
        fallback: fallback.to_string(),
        always_try_fallback,
    }
}

fn rotator(config: RegionRotationConfig) -> RegionRotator {
    RegionRotator::new(RetryExecutor::new(), config).unwrap()
}

fn setting(max_retries: u32) -> RetrySetting {
    RetrySetting::Options(RetryOptions {
        max_retries: Some(max_retries),
        timeout_retries: Some(0),
        jitter: Some(false),
        delay_ms: Some(10),
        ..Default::default()
    })
}

/// Operation that records the region of each invocation and replies from a
/// script of per-attempt outcomes, repeating the final entry.
fn scripted(
    regions_seen: Arc<Mutex<Vec<String>>>,
    script: Vec<Result<&'static str, &'static str>>,
) -> impl Fn(String) -> std::pin::Pin<
    Box<dyn Future<Output = Result<&'static str, ProviderError>> + Send>,
> {
    move |region: String| {
        let regions_seen = regions_seen.clone();
        let script = script.clone();
        Box::pin(async move {
            let mut seen = regions_seen.lock().unwrap();
            seen.push(region);
            let step = script[(seen.len() - 1).min(script.len() - 1)];
            step.map_err(ProviderError::api)
        })
    }
}

#[tokio::test(start_paused = true)]
async fn rotation_advances_only_on_quota_failures() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(&["us-central1", "us-east4"], "global", true));

    // Retryable failures burn the budget without moving the cursor, so all
    // budgeted attempts stay on the first candidate. Budget exhaustion still
    // grants the bonus fallback attempt regardless of which general-class
    // errors consumed it.
    let err = rotator
        .run(
            "generate_image",
            Some(&setting(2)),
            scripted(regions_seen.clone(), vec![Err("503 Service Unavailable")]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.message(), "503 Service Unavailable");
    assert_eq!(
        *regions_seen.lock().unwrap(),
        vec!["us-central1", "us-central1", "us-central1", "global"]
    );
}

#[tokio::test(start_paused = true)]
async fn retryable_exhaustion_without_fallback_opt_in_stays_put() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(&["us-central1", "us-east4"], "global", false));

    let err = rotator
        .run(
            "generate_image",
            Some(&setting(2)),
            scripted(regions_seen.clone(), vec![Err("503 Service Unavailable")]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.message(), "503 Service Unavailable");
    assert_eq!(
        *regions_seen.lock().unwrap(),
        vec!["us-central1", "us-central1", "us-central1"]
    );
}

#[tokio::test]
async fn non_retryable_failure_never_rotates() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(&["us-central1", "us-east4"], "global", true));

    let err = rotator
        .run(
            "generate_image",
            Some(&setting(5)),
            scripted(regions_seen.clone(), vec![Err("403 Forbidden")]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.message(), "403 Forbidden");
    assert_eq!(*regions_seen.lock().unwrap(), vec!["us-central1"]);
}

#[tokio::test(start_paused = true)]
async fn exhausted_candidate_list_clamps_to_fallback() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(
        &["us-central1", "us-east4", "europe-west4"],
        "global",
        true,
    ));

    let err = rotator
        .run(
            "generate_image",
            Some(&setting(5)),
            scripted(regions_seen.clone(), vec![Err("429 Too Many Requests")]),
        )
        .await
        .unwrap_err();

    // A -> B -> C -> F, then stays on F; the final attempt already ran on
    // the fallback, so no bonus attempt follows.
    assert_eq!(
        *regions_seen.lock().unwrap(),
        vec![
            "us-central1",
            "us-east4",
            "europe-west4",
            "global",
            "global",
            "global"
        ]
    );
    assert_eq!(err.message(), "429 Too Many Requests");
}

#[tokio::test(start_paused = true)]
async fn no_bonus_attempt_when_fallback_already_reached() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(&["us-central1", "us-east4"], "global", true));

    let _ = rotator
        .run(
            "generate_image",
            Some(&setting(5)),
            scripted(regions_seen.clone(), vec![Err("429 Too Many Requests")]),
        )
        .await;

    // Six budgeted attempts, not seven.
    assert_eq!(regions_seen.lock().unwrap().len(), 6);
    assert_eq!(
        *regions_seen.lock().unwrap(),
        vec![
            "us-central1",
            "us-east4",
            "global",
            "global",
            "global",
            "global"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn bonus_fallback_attempt_can_rescue_the_request() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(
        &["us-central1", "us-east4", "europe-west4"],
        "global",
        true,
    ));

    // Budget of one retry: both budgeted attempts fail on quota, leaving the
    // cursor short of the fallback; the bonus attempt succeeds there.
    let value = rotator
        .run(
            "generate_image",
            Some(&setting(1)),
            scripted(
                regions_seen.clone(),
                vec![
                    Err("429 Too Many Requests"),
                    Err("429 Too Many Requests"),
                    Ok("image-bytes"),
                ],
            ),
        )
        .await
        .unwrap();

    assert_eq!(value, "image-bytes");
    assert_eq!(
        *regions_seen.lock().unwrap(),
        vec!["us-central1", "us-east4", "global"]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_bonus_attempt_error_surfaces() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(
        &["us-central1", "us-east4", "europe-west4"],
        "global",
        true,
    ));

    let err = rotator
        .run(
            "generate_image",
            Some(&setting(1)),
            scripted(
                regions_seen.clone(),
                vec![
                    Err("429 Too Many Requests"),
                    Err("429 Too Many Requests"),
                    Err("503 fallback overloaded"),
                ],
            ),
        )
        .await
        .unwrap_err();

    // The bonus attempt's error wins over the exhausted-budget error.
    assert_eq!(err.message(), "503 fallback overloaded");
    assert_eq!(regions_seen.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn bonus_attempt_respects_opt_out() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(
        &["us-central1", "us-east4", "europe-west4"],
        "global",
        false,
    ));

    let err = rotator
        .run(
            "generate_image",
            Some(&setting(1)),
            scripted(regions_seen.clone(), vec![Err("429 Too Many Requests")]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.message(), "429 Too Many Requests");
    assert_eq!(regions_seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn disabled_retries_never_reach_the_fallback() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(&["us-central1", "us-east4"], "global", true));

    let err = rotator
        .run(
            "generate_image",
            Some(&RetrySetting::Flag(false)),
            scripted(regions_seen.clone(), vec![Err("429 Too Many Requests")]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.message(), "429 Too Many Requests");
    assert_eq!(*regions_seen.lock().unwrap(), vec!["us-central1"]);
}

#[tokio::test(start_paused = true)]
async fn timeout_exhaustion_does_not_trigger_the_bonus_attempt() {
    let regions_seen = Arc::new(Mutex::new(Vec::new()));
    let rotator = rotator(rotation(&["us-central1", "us-east4"], "global", true));
    let setting = RetrySetting::Options(RetryOptions {
        timeout_ms: Some(50),
        timeout_retries: Some(0),
        ..Default::default()
    });

    let recorder = regions_seen.clone();
    let err = rotator
        .run("generate_image", Some(&setting), move |region: String| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(region);
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err::<(), _>(ProviderError::api("unreachable"))
            }
        })
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(regions_seen.lock().unwrap().len(), 1);
}

#[test]
fn empty_candidate_list_is_rejected() {
    let err = RegionRotator::new(
        RetryExecutor::new(),
        rotation(&[], "global", true),
    )
    .unwrap_err();
    assert!(err.message.contains("candidate"));
}
