use super::*;
use std::path::PathBuf;

#[test]
fn test_config_default() {
    let config = ValidatorConfig::default();

    assert!(config.model_dir.is_none());
    assert_eq!(config.threshold, DEFAULT_THRESHOLD);
    assert_eq!(config.max_length, crate::constants::VALIDATOR_MAX_LENGTH);
}

#[test]
fn test_config_tokenizer_location() {
    let config = ValidatorConfig::new("/models/t5");
    assert_eq!(config.tokenizer_location(), Some(&PathBuf::from("/models/t5")));

    let config = config.with_tokenizer("/models/t5-tokenizer");
    assert_eq!(
        config.tokenizer_location(),
        Some(&PathBuf::from("/models/t5-tokenizer"))
    );
}

#[test]
fn test_config_invalid_threshold() {
    let config = ValidatorConfig::default().with_threshold(1.5);
    assert!(config.validate().unwrap_err().contains("threshold must be between 0.0 and 1.0"));

    let err = RelevanceValidator::load(config).unwrap_err();
    assert!(matches!(err, ValidatorError::InvalidConfig { .. }));
}

#[test]
fn test_config_validate() {
    assert!(ValidatorConfig::default().validate().is_ok());

    let invalid = ValidatorConfig {
        max_length: 1,
        ..Default::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_load_with_missing_model() {
    let err = RelevanceValidator::load(ValidatorConfig::new("/nonexistent/t5")).unwrap_err();
    assert!(matches!(err, ValidatorError::ModelLoadFailed { .. }));
}

#[test]
fn test_prompt_layout() {
    assert_eq!(
        relevance_prompt("оплата налог", "Через кабинет"),
        "оплата налог Document: Через кабинет Relevant: "
    );
}

#[test]
fn test_stub_judgement() {
    let validator = RelevanceValidator::stub().unwrap();
    assert!(!validator.is_model_loaded());

    let relevant = validator.judge("оплата налог", "налог оплата онлайн").unwrap();
    assert!(relevant.is_affirmative());
    assert!((relevant.confidence - 2.0 / 3.0).abs() < 1e-6);

    let irrelevant = validator.judge("оплата налог", "регистрация ооо").unwrap();
    assert!(!irrelevant.is_affirmative());
    assert_eq!(irrelevant.confidence, 0.0);
}

#[test]
fn test_accepts_requires_affirmative_and_threshold() {
    let validator =
        RelevanceValidator::load(ValidatorConfig::default().with_threshold(0.7)).unwrap();

    let confident = Judgement {
        answer: AFFIRMATIVE_ANSWER.to_string(),
        confidence: 0.7,
    };
    let hesitant = Judgement {
        answer: AFFIRMATIVE_ANSWER.to_string(),
        confidence: 0.69,
    };
    let negative = Judgement {
        answer: NEGATIVE_ANSWER.to_string(),
        confidence: 0.99,
    };

    assert!(validator.accepts(&confident));
    assert!(!validator.accepts(&hesitant));
    assert!(!validator.accepts(&negative));
}

#[test]
fn test_sigmoid() {
    assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    assert!(sigmoid(10.0) > 0.99);
    assert!(sigmoid(-10.0) < 0.01);
}
