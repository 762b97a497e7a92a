//! Language code mapping between tesseract codes and BCP-47 hints.

fn split_codes(language: &str) -> impl Iterator<Item = String> + '_ {
    language
        .split(['+', ',', ';', ' '])
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

/// Convert a tesseract-style language list (`eng+vie`) into BCP-47 hints
/// for the vision service. Unknown 2 or 3 letter codes pass through,
/// anything else is dropped.
pub fn language_hints(language: &str) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();
    for code in split_codes(language) {
        let hint = match code.as_str() {
            "eng" => "en",
            "vie" | "vin" => "vi",
            "jpn" => "ja",
            "zho" | "chi_sim" | "chi_tra" => "zh",
            "spa" => "es",
            "fra" | "fre" => "fr",
            "deu" | "ger" => "de",
            "ita" => "it",
            "rus" => "ru",
            "ara" => "ar",
            "hin" => "hi",
            "tha" => "th",
            "kor" => "ko",
            "por" => "pt",
            other if (2..=3).contains(&other.len()) => other,
            _ => continue,
        };
        if !hints.iter().any(|h| h == hint) {
            hints.push(hint.to_string());
        }
    }
    hints
}

/// Tesseract traineddata name for the first code in the list.
pub fn tesseract_language(language: &str) -> &'static str {
    match split_codes(language).next().as_deref() {
        Some("vie" | "vin") => "vie",
        Some("jpn") => "jpn",
        Some("chi_sim") => "chi_sim",
        Some("chi_tra") => "chi_tra",
        Some("spa") => "spa",
        Some("fra" | "fre") => "fra",
        Some("deu" | "ger") => "deu",
        Some("ita") => "ita",
        Some("rus") => "rus",
        Some("ara") => "ara",
        Some("hin") => "hin",
        Some("tha") => "tha",
        Some("kor") => "kor",
        Some("por") => "por",
        _ => "eng",
    }
}
