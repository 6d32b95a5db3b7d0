//! Recipe sync core: pure record model, instruction-text parser and the
//! mapping onto the recipe plugin's metadata schema.
mod labels;
mod mapper;
mod parser;
mod record;

pub use labels::{LabelTable, DIFFICULTY, SEASON};
pub use mapper::{
    map, Ingredient, IngredientSection, InstructionSection, InstructionStep,
    MappedRecipeMetadata, DEFAULT_KEYWORDS, DEFAULT_SERVINGS, INGREDIENTS_TITLE,
    INSTRUCTIONS_TITLE, RECIPE_NOTES, TIME_UNIT,
};
pub use parser::{parse, ParsedInstructions, CALORIES_NO_DATA, DEFAULT_MINUTES};
pub use record::{ExternalId, SourceRecipeRecord};
