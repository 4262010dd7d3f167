use std::io::Write;

use app_flow::AppCatalog;
use ridescan_cli::{load_config, AutomationConfig};
use ridescan_core_types::AppKey;
use text_injector::Strictness;

#[tokio::test]
async fn yaml_sections_override_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
apps: [ola, nammayatri]
policy:
  locate_attempts: 4
  inter_app_delay_ms: 1000
injection:
  strictness: verify_by_readback
keywords:
  hint_keywords: ["Kahan jana hai"]
  interstitial_labels: ["Dismiss"]
"#
    )
    .unwrap();

    let loaded = load_config(Some(file.path())).await.unwrap();
    let config = loaded.config;
    assert_eq!(loaded.path, file.path());
    assert_eq!(config.apps, vec![AppKey::new("ola"), AppKey::new("nammayatri")]);
    assert_eq!(config.policy.locate_attempts, 4);
    assert_eq!(config.policy.inter_app_delay_ms, 1000);
    assert_eq!(config.policy.launch_settle_ms, 5000);
    assert_eq!(config.injection.strictness, Strictness::VerifyByReadback);
    assert_eq!(config.injection.direct_settle_ms, 1500);

    let tables = config.keyword_tables();
    assert!(tables.hint_matches("KAHAN JANA HAI?"));
    assert!(tables.hint_matches("Where to?"));
    assert_eq!(tables.interstitial_labels.first().map(String::as_str), Some("Skip"));
    assert_eq!(tables.interstitial_labels.last().map(String::as_str), Some("Dismiss"));
    assert!(config.validate(&AppCatalog::builtin()).is_ok());
}

#[tokio::test]
async fn missing_file_means_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_config(Some(&dir.path().join("absent.yaml"))).await.unwrap();
    assert_eq!(loaded.config.apps, AppCatalog::default_keys());
    assert_eq!(loaded.config.keyword_tables(), Default::default());
}

#[tokio::test]
async fn malformed_file_is_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "policy: [not, a, map]").unwrap();
    assert!(load_config(Some(file.path())).await.is_err());
}

#[test]
fn unknown_apps_fail_validation() {
    let config = AutomationConfig::from_yaml("apps: [uber, lyft]").unwrap();
    let err = config.validate(&AppCatalog::builtin()).unwrap_err();
    assert!(format!("{:#}", err).contains("lyft"));
}
