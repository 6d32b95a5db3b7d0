use serde::{Deserialize, Serialize};

use crate::labels::{DIFFICULTY, SEASON};
use crate::parser::parse;
use crate::SourceRecipeRecord;

pub const TIME_UNIT: &str = "min";
pub const DEFAULT_SERVINGS: &str = "4";
pub const DEFAULT_KEYWORDS: &str = "przepis, AI Cooking App";
pub const INGREDIENTS_TITLE: &str = "Składniki";
pub const INSTRUCTIONS_TITLE: &str = "Sposób przygotowania";
pub const RECIPE_NOTES: &str = "Wygenerowano automatycznie przez AI Cooking App.";

/// Structured recipe stored as one metadata blob on the local entry.
///
/// Field names follow the consuming plugin's schema, so serialization uses
/// its camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedRecipeMetadata {
    pub recipe_subtitle: String,
    pub recipe_description: String,
    pub recipe_keywords: String,
    pub difficulty_level: String,
    pub prep_time: String,
    pub prep_time_unit: String,
    pub cook_time: String,
    pub cook_time_unit: String,
    pub rest_time: String,
    pub rest_time_unit: String,
    pub total_duration: u64,
    pub total_duration_unit: String,
    pub best_season: String,
    pub recipe_calories: String,
    pub no_of_servings: String,
    pub ingredient_title: String,
    pub recipe_ingredients: Vec<IngredientSection>,
    pub instructions_title: String,
    pub recipe_instructions: Vec<InstructionSection>,
    pub recipe_notes: String,
    pub image_gallery_images: Vec<String>,
    pub video_gallery_vids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientSection {
    pub section_title: String,
    pub ingredients: Vec<Ingredient>,
}

/// Quantity, unit and notes stay empty: the free text does not separate them
/// from the name, but the consumer expects the keys to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub quantity: String,
    pub unit: String,
    #[serde(rename = "ingredient")]
    pub name: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionSection {
    pub section_title: String,
    #[serde(rename = "instruction")]
    pub steps: Vec<InstructionStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionStep {
    #[serde(rename = "instructionTitle")]
    pub title: String,
    #[serde(rename = "instruction")]
    pub text: String,
    pub image: String,
    #[serde(rename = "videoURL")]
    pub video: String,
    #[serde(rename = "instructionNotes")]
    pub notes: String,
}

impl Ingredient {
    fn named(name: String) -> Self {
        Self {
            quantity: String::new(),
            unit: String::new(),
            name,
            notes: String::new(),
        }
    }
}

impl InstructionStep {
    fn with_text(text: String) -> Self {
        Self {
            title: String::new(),
            text,
            image: String::new(),
            video: String::new(),
            notes: String::new(),
        }
    }
}

impl MappedRecipeMetadata {
    /// Names from the first ingredient section, in order.
    pub fn ingredient_names(&self) -> Vec<String> {
        self.recipe_ingredients
            .first()
            .map(|section| {
                section
                    .ingredients
                    .iter()
                    .filter(|item| !item.name.is_empty())
                    .map(|item| item.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn ingredient_count(&self) -> usize {
        self.recipe_ingredients
            .first()
            .map_or(0, |section| section.ingredients.len())
    }

    /// Step texts from the first instruction section, in order.
    pub fn step_texts(&self) -> Vec<String> {
        self.recipe_instructions
            .first()
            .map(|section| section.steps.iter().map(|step| step.text.clone()).collect())
            .unwrap_or_default()
    }
}

/// Map an upstream record onto the plugin's recipe schema. Never fails.
pub fn map(record: &SourceRecipeRecord) -> MappedRecipeMetadata {
    let parsed = parse(record.instructions.as_deref().unwrap_or_default());
    let total_duration = minutes(&parsed.prep_minutes).saturating_add(minutes(&parsed.cook_minutes));

    let keywords = record
        .keywords
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(DEFAULT_KEYWORDS);

    MappedRecipeMetadata {
        recipe_subtitle: String::new(),
        recipe_description: record.description.clone().unwrap_or_default(),
        recipe_keywords: keywords.to_string(),
        difficulty_level: DIFFICULTY.label(record.difficulty.as_deref()).to_string(),
        prep_time: parsed.prep_minutes,
        prep_time_unit: TIME_UNIT.to_string(),
        cook_time: parsed.cook_minutes,
        cook_time_unit: TIME_UNIT.to_string(),
        rest_time: "0".to_string(),
        rest_time_unit: TIME_UNIT.to_string(),
        total_duration,
        total_duration_unit: TIME_UNIT.to_string(),
        best_season: SEASON.label(record.season.as_deref()).to_string(),
        recipe_calories: parsed.calories,
        no_of_servings: DEFAULT_SERVINGS.to_string(),
        ingredient_title: INGREDIENTS_TITLE.to_string(),
        recipe_ingredients: vec![IngredientSection {
            section_title: String::new(),
            ingredients: parsed.ingredients.into_iter().map(Ingredient::named).collect(),
        }],
        instructions_title: INSTRUCTIONS_TITLE.to_string(),
        recipe_instructions: vec![InstructionSection {
            section_title: String::new(),
            steps: parsed
                .steps
                .into_iter()
                .map(InstructionStep::with_text)
                .collect(),
        }],
        recipe_notes: RECIPE_NOTES.to_string(),
        image_gallery_images: Vec::new(),
        video_gallery_vids: Vec::new(),
    }
}

fn minutes(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}
