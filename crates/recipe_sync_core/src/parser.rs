use std::sync::LazyLock;

use regex::Regex;

/// Minutes assumed when the text carries no usable time marker.
pub const DEFAULT_MINUTES: &str = "15";

/// Calorie value the upstream writes when it has no estimate ("no data").
pub const CALORIES_NO_DATA: &str = "brak danych";

static INGREDIENTS_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\s*Ingredients([^#]*)").expect("Invalid ingredients regex"));

static INSTRUCTIONS_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\s*Instructions([^#]*)").expect("Invalid instructions regex")
});

static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*-\s*").expect("Invalid bullet regex"));

static NUMBER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s*").expect("Invalid numbered step regex"));

static PREP_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Prep Time:\s*(\d+)").expect("Invalid prep time regex"));

static COOK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Cook Time:\s*(\d+)").expect("Invalid cook time regex"));

static CALORIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Calories:[ \t]*(.*)$").expect("Invalid calories regex"));

static KCAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*kcal$").expect("Invalid kcal regex"));

/// Fields recovered from a free-text instructions blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstructions {
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub prep_minutes: String,
    pub cook_minutes: String,
    /// `"<value> kcal"`, or empty when the text has no usable calorie line.
    pub calories: String,
}

impl Default for ParsedInstructions {
    fn default() -> Self {
        Self {
            ingredients: Vec::new(),
            steps: Vec::new(),
            prep_minutes: DEFAULT_MINUTES.to_string(),
            cook_minutes: DEFAULT_MINUTES.to_string(),
            calories: String::new(),
        }
    }
}

/// Parse the `# Ingredients` / `# Instructions` layout produced upstream.
///
/// A section body runs from its heading to the next `#` or the end of the
/// text. Missing sections, headings without a body, or text without any `#`
/// degrade to empty lists; absent or non-numeric times keep the default.
pub fn parse(raw_text: &str) -> ParsedInstructions {
    ParsedInstructions {
        ingredients: section_items(raw_text, &INGREDIENTS_SECTION, &BULLET_MARKER),
        steps: section_items(raw_text, &INSTRUCTIONS_SECTION, &NUMBER_MARKER),
        prep_minutes: first_capture(raw_text, &PREP_TIME)
            .unwrap_or(DEFAULT_MINUTES)
            .to_string(),
        cook_minutes: first_capture(raw_text, &COOK_TIME)
            .unwrap_or(DEFAULT_MINUTES)
            .to_string(),
        calories: calories(raw_text),
    }
}

fn section_items(text: &str, heading: &Regex, marker: &Regex) -> Vec<String> {
    let Some(body) = first_capture(text, heading) else {
        return Vec::new();
    };
    marker
        .split(body.trim())
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn first_capture<'t>(text: &'t str, pattern: &Regex) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn calories(text: &str) -> String {
    let value = first_capture(text, &CALORIES).map(str::trim).unwrap_or_default();
    let value = KCAL_SUFFIX.replace(value, "");
    if value.is_empty() || value.eq_ignore_ascii_case(CALORIES_NO_DATA) {
        return String::new();
    }
    format!("{value} kcal")
}
