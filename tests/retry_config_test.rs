use std::time::Duration;

use tron_gateway::RetryConfig;
use tron_gateway::providers::RetrySettings;

#[test]
fn retry_config_defaults() {
    let config = RetryConfig::default();
    assert_eq!(config.max_attempts, 3);
    assert_eq!(config.initial_delay, Duration::from_millis(500));
    assert_eq!(config.max_delay, Duration::from_secs(30));
    assert!(config.jitter);
}

#[test]
fn retry_config_disabled() {
    assert_eq!(RetryConfig::disabled().max_attempts, 1);
}

#[test]
fn retry_config_delay_calculation() {
    let config = RetryConfig::new()
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(10))
        .jitter(false);

    assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
    assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
    assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
}

#[test]
fn retry_config_delay_capped_at_max() {
    let config = RetryConfig::new()
        .initial_delay(Duration::from_secs(1))
        .max_delay(Duration::from_secs(5))
        .jitter(false);

    assert_eq!(config.delay_for_attempt(3), Duration::from_secs(5));
    assert_eq!(config.delay_for_attempt(40), Duration::from_secs(5));
}

#[test]
fn retry_after_hint_wins() {
    let config = RetryConfig::new()
        .initial_delay(Duration::from_millis(100))
        .jitter(true);

    // hints are honoured verbatim, even with jitter on
    let delay = config.effective_delay(0, Some(Duration::from_secs(5)));
    assert_eq!(delay, Duration::from_secs(5));
}

#[test]
fn jittered_delay_stays_in_bounds() {
    let config = RetryConfig::new()
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(1))
        .jitter(true);

    for _ in 0..50 {
        let delay = config.effective_delay(0, None);
        assert!(delay >= Duration::from_millis(50), "{delay:?}");
        assert!(delay < Duration::from_millis(150), "{delay:?}");
    }
}

#[test]
fn jittered_delays_spread_across_the_range() {
    let config = RetryConfig::new()
        .initial_delay(Duration::from_millis(1000))
        .max_delay(Duration::from_secs(10))
        .jitter(true);

    let delays: Vec<Duration> = (0..200).map(|_| config.effective_delay(0, None)).collect();

    // back-to-back calls must not collapse onto one factor
    assert!(delays.iter().any(|d| *d < Duration::from_millis(900)));
    assert!(delays.iter().any(|d| *d > Duration::from_millis(1100)));
    let first = delays[0];
    assert!(delays.iter().any(|d| *d != first));
}

#[test]
fn settings_convert_to_config() {
    let settings = RetrySettings {
        max_attempts: 0,
        initial_delay_ms: 250,
        max_delay_ms: 2_000,
        jitter: false,
    };
    let config: RetryConfig = settings.into();

    // zero attempts would never call the model
    assert_eq!(config.max_attempts, 1);
    assert_eq!(config.initial_delay, Duration::from_millis(250));
    assert_eq!(config.max_delay, Duration::from_secs(2));
    assert!(!config.jitter);
}

#[test]
fn settings_defaults_match_config_defaults() {
    let config: RetryConfig = RetrySettings::default().into();
    let defaults = RetryConfig::default();
    assert_eq!(config.max_attempts, defaults.max_attempts);
    assert_eq!(config.initial_delay, defaults.initial_delay);
    assert_eq!(config.max_delay, defaults.max_delay);
}
