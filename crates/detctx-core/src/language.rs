/// Viewer language used for translation keys.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Reduce a locale tag to its primary language subtag.
///
/// Accepts browser tags (`es-ES`) and POSIX locales (`pt_BR.UTF-8`).
/// Missing, empty, and `C`/`POSIX` locales fall back to English.
pub fn language_from_locale(locale: Option<&str>) -> String {
    let primary = locale
        .unwrap_or_default()
        .split(['-', '_', '.'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match primary.as_str() {
        "" | "c" | "posix" => DEFAULT_LANGUAGE.to_string(),
        _ => primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_tag() {
        assert_eq!(language_from_locale(Some("es-ES")), "es");
        assert_eq!(language_from_locale(Some("EN-us")), "en");
    }

    #[test]
    fn posix_locale() {
        assert_eq!(language_from_locale(Some("pt_BR.UTF-8")), "pt");
        assert_eq!(language_from_locale(Some("C.UTF-8")), "en");
    }

    #[test]
    fn missing_locale_is_english() {
        assert_eq!(language_from_locale(None), "en");
        assert_eq!(language_from_locale(Some("")), "en");
    }
}
