use chrono::Utc;
use remitlens::core::{CompareError, CompareRequest, Currency, DeliveryMethod, RateError};
use remitlens::{AppCommand, CompareArgs};
use rust_decimal::Decimal;
use std::fs;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_frankfurter_mock(
        from: &str,
        to: &str,
        rate: &str,
        date: &str,
    ) -> MockServer {
        let mock_server = MockServer::start().await;
        let body = format!(
            r#"{{"amount":1.0,"base":"{from}","date":"{date}","rates":{{"{to}":{rate}}}}}"#
        );

        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("from", from))
            .and(query_param("to", to))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// Writes a config with the built-in providers and the given `rates:` section.
    pub fn write_config(dir: &std::path::Path, rates_section: &str) -> std::path::PathBuf {
        let builtin = remitlens::core::config::EXAMPLE_CONFIG;
        let providers = &builtin[builtin
            .find("\nproviders:")
            .expect("example config has a providers section")..];
        let content = format!(
            "data_path: \"{}\"\n{rates_section}\n{providers}",
            dir.join("data").display()
        );
        let config_path = dir.join("config.yaml");
        std::fs::write(&config_path, content).expect("Failed to write config file");
        config_path
    }

    /// `rates:` section reading live rates from a mocked Frankfurter server.
    pub fn frankfurter_rates(uri: &str, persist: bool) -> String {
        format!(
            "rates:\n  source: frankfurter\n  base_url: \"{uri}\"\n  \
             retries: 0\n  persist: {persist}"
        )
    }
}

fn compare_args(amount: i64, from: Currency) -> CompareArgs {
    CompareArgs {
        amount: Decimal::from(amount),
        from: Some(from),
        to: None,
        method: None,
        providers: Vec::new(),
        refresh: false,
    }
}

fn compare(amount: i64, from: Currency) -> AppCommand {
    AppCommand::Compare(compare_args(amount, from))
}

#[test_log::test(tokio::test)]
async fn test_builtin_config_end_to_end() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, remitlens::core::config::EXAMPLE_CONFIG)
        .expect("Failed to write config file");
    let config_path = config_path.to_str();

    for command in [
        compare(500, Currency::USD),
        compare(100, Currency::AED),
        AppCommand::Providers,
        AppCommand::Rates { to: None },
    ] {
        info!(?command, "Running against the built-in configuration");
        let result = remitlens::run_command(command, config_path).await;
        assert!(result.is_ok(), "Command failed with: {:?}", result.err());
    }
}

#[test_log::test(tokio::test)]
async fn test_full_compare_flow_with_mock() {
    let today = Utc::now().date_naive().to_string();
    let mock_server = test_utils::create_frankfurter_mock("USD", "KES", "129.5", &today).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &test_utils::frankfurter_rates(&mock_server.uri(), false),
    );

    let result = remitlens::run_command(compare(500, Currency::USD), config_path.to_str()).await;
    assert!(result.is_ok(), "Compare failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_disk_cache_answers_later_runs_until_refresh() {
    let today = Utc::now().date_naive().to_string();
    let mock_server = test_utils::create_frankfurter_mock("USD", "KES", "129.5", &today).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &test_utils::frankfurter_rates(&mock_server.uri(), true),
    );
    let request_count = || async {
        mock_server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    };

    remitlens::run_command(compare(500, Currency::USD), config_path.to_str())
        .await
        .expect("first run should fetch the rate");
    assert_eq!(request_count().await, 1);
    assert!(temp_dir.path().join("data").join("cache").exists());

    remitlens::run_command(compare(750, Currency::USD), config_path.to_str())
        .await
        .expect("second run should use the cached rate");
    assert_eq!(request_count().await, 1);

    let refresh = AppCommand::Compare(CompareArgs {
        refresh: true,
        ..compare_args(500, Currency::USD)
    });
    remitlens::run_command(refresh, config_path.to_str())
        .await
        .expect("refresh should refetch the rate");
    assert_eq!(request_count().await, 2);
}

#[test_log::test(tokio::test)]
async fn test_rate_failure_is_reported_not_defaulted() {
    // No mock mounted for the pair, so the server answers 404.
    let mock_server = wiremock::MockServer::start().await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &test_utils::frankfurter_rates(&mock_server.uri(), false),
    );

    let result = remitlens::run_command(compare(500, Currency::USD), config_path.to_str()).await;
    let err = result.expect_err("a missing rate must fail the comparison");
    let rate_err = err
        .downcast_ref::<CompareError>()
        .expect("error should be a CompareError");
    assert!(matches!(
        rate_err,
        CompareError::RateUnavailable(RateError::Unavailable { .. })
    ));
}

#[test_log::test(tokio::test)]
async fn test_fixed_rates_flow() {
    let today = Utc::now().date_naive();
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &format!(
            "rates:\n  source: fixed\n  fixed:\n    \
             - {{ from: GBP, to: KES, rate: 164.20, as_of: {today} }}"
        ),
    );

    let cash_pickup = AppCommand::Compare(CompareArgs {
        method: Some(DeliveryMethod::CashPickup),
        ..compare_args(200, Currency::GBP)
    });
    let result = remitlens::run_command(cash_pickup, config_path.to_str()).await;
    assert!(result.is_ok(), "Compare failed with: {:?}", result.err());

    let rates = remitlens::run_command(AppCommand::Rates { to: None }, config_path.to_str()).await;
    assert!(rates.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_stale_fixed_rate_is_refused() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(
        temp_dir.path(),
        "rates:\n  source: fixed\n  fixed_max_age_days: 4\n  fixed:\n    \
         - { from: USD, to: KES, rate: 129.50, as_of: 2020-01-01 }",
    );

    let err = remitlens::run_command(compare(500, Currency::USD), config_path.to_str())
        .await
        .expect_err("stale rate must not be used");
    assert!(matches!(
        err.downcast_ref::<CompareError>(),
        Some(CompareError::RateUnavailable(RateError::Stale { .. }))
    ));
}

#[test_log::test(tokio::test)]
async fn test_open_er_api_source() {
    let mock_server = wiremock::MockServer::start().await;
    let updated = Utc::now().timestamp();
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/v6/latest/EUR"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"result":"success","time_last_update_unix":{updated},"rates":{{"KES":140.8}}}}"#
        )))
        .mount(&mock_server)
        .await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &format!(
            "rates:\n  source: open_er_api\n  base_url: \"{}\"\n  \
             retries: 0\n  persist: false",
            mock_server.uri()
        ),
    );

    let result = remitlens::run_command(compare(300, Currency::EUR), config_path.to_str()).await;
    assert!(result.is_ok(), "Compare failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_fails() {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        r#"
providers:
  - name: "Broken"
    fee: { type: flat, amount: -1 }
    spread_percent: 1.0
    delivery:
      - { method: mobile_money, speed: instant }
    corridors:
      - { from: USD, to: KES }
"#,
    )
    .expect("Failed to write config file");

    let result =
        remitlens::run_command(AppCommand::Providers, config_file.path().to_str()).await;
    assert!(result.is_err());
}

#[test]
fn test_request_builder_is_public_api() {
    let request = CompareRequest::new(Decimal::from(100), Currency::CAD, Currency::KES)
        .with_delivery_method(DeliveryMethod::BankDeposit);
    assert_eq!(request.delivery_method, Some(DeliveryMethod::BankDeposit));
}
