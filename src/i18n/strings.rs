/// User-facing strings for the slider editor, per interface language.
///
/// Placeholders use `{language}` for the upper-cased track code.
#[derive(Debug, Clone)]
pub struct UiStrings {
    // ==================== Validation Errors ====================
    /// Shown when no track carries any content
    pub no_content: &'static str,

    /// Placeholders: {language}
    pub title_required: &'static str,

    /// Placeholders: {language}
    pub description_required: &'static str,

    /// Placeholders: {language}
    pub primary_button_text_required: &'static str,

    /// Placeholders: {language}
    pub primary_button_url_required: &'static str,

    // ==================== Validation Warnings ====================
    /// Placeholders: {language}
    pub secondary_button_url_missing: &'static str,

    /// Placeholders: {language}
    pub button_url_suspicious: &'static str,

    // ==================== Editor Messages ====================
    pub background_image_required: &'static str,

    pub statistics_limit: &'static str,

    // ==================== Collection Messages ====================
    /// Shown after a failed write forced a reload
    pub resynced: &'static str,

    pub order_saved: &'static str,

    pub entry_saved: &'static str,

    pub entry_deleted: &'static str,
}

// ==================== English Strings ====================

pub const ENGLISH_STRINGS: UiStrings = UiStrings {
    no_content: "At least one language must have content",
    title_required: "Title is required ({language})",
    description_required: "Description is required ({language})",
    primary_button_text_required: "Primary button text is required ({language})",
    primary_button_url_required: "Primary button URL is required ({language})",
    secondary_button_url_missing: "Secondary button has text but no URL ({language})",
    button_url_suspicious: "Button URL does not look like a link ({language})",
    background_image_required: "A background image is required",
    statistics_limit: "A slide can show at most 4 statistics",
    resynced: "Changes could not be saved; the list was reloaded",
    order_saved: "Order saved",
    entry_saved: "Slider saved",
    entry_deleted: "Slider deleted",
};

// ==================== Turkish Strings ====================

pub const TURKISH_STRINGS: UiStrings = UiStrings {
    no_content: "En az bir dilde içerik girilmelidir",
    title_required: "Başlık zorunludur ({language})",
    description_required: "Açıklama zorunludur ({language})",
    primary_button_text_required: "Birincil buton metni zorunludur ({language})",
    primary_button_url_required: "Birincil buton bağlantısı zorunludur ({language})",
    secondary_button_url_missing: "İkincil buton metni var ancak bağlantısı yok ({language})",
    button_url_suspicious: "Buton bağlantısı geçerli görünmüyor ({language})",
    background_image_required: "Arka plan görseli zorunludur",
    statistics_limit: "Bir slaytta en fazla 4 istatistik gösterilebilir",
    resynced: "Değişiklikler kaydedilemedi; liste yeniden yüklendi",
    order_saved: "Sıralama kaydedildi",
    entry_saved: "Slayt kaydedildi",
    entry_deleted: "Slayt silindi",
};

impl UiStrings {
    /// Strings for an interface language, falling back to English.
    pub fn for_code(code: &str) -> &'static UiStrings {
        match code.trim().to_lowercase().as_str() {
            "tr" => &TURKISH_STRINGS,
            _ => &ENGLISH_STRINGS,
        }
    }
}

/// Fill the `{language}` placeholder with the upper-cased track code.
pub fn with_language(template: &str, code: &str) -> String {
    template.replace("{language}", &code.to_uppercase())
}
