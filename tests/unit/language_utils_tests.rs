/*!
 * Tests for language utility functions
 */

use doc_translator::language_utils::{get_language_name, normalize_to_part2t, target_language_label};

/// Test normalization of language codes to ISO 639-2/T format
#[test]
fn test_normalize_to_part2t_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("FR").unwrap(), "fra");
    assert_eq!(normalize_to_part2t(" deu ").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("chi").unwrap(), "zho");
}

/// Test invalid codes are rejected
#[test]
fn test_normalize_to_part2t_withInvalidCodes_shouldFail() {
    assert!(normalize_to_part2t("").is_err());
    assert!(normalize_to_part2t("e").is_err());
    assert!(normalize_to_part2t("French").is_err());
}

/// Test language names for codes
#[test]
fn test_get_language_name_withCodes_shouldReturnEnglishName() {
    assert_eq!(get_language_name("fr").unwrap(), "French");
    assert_eq!(get_language_name("de").unwrap(), "German");
    assert_eq!(get_language_name("spa").unwrap(), "Spanish");
}

/// Test the prompt label expands codes and passes names through
#[test]
fn test_target_language_label_withCodesAndNames_shouldRenderReadableLabel() {
    assert_eq!(target_language_label("fr"), "French");
    assert_eq!(target_language_label("ja"), "Japanese");
    assert_eq!(target_language_label("French"), "French");
    assert_eq!(target_language_label(" 简体中文 "), "简体中文");
    assert_eq!(target_language_label("Brazilian Portuguese"), "Brazilian Portuguese");
}
