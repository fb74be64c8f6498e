//! Static catalog of the models offered for each provider.

use serde::Serialize;

use crate::provider::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Model {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: Provider,
}

const fn model(id: &'static str, name: &'static str, provider: Provider) -> Model {
    Model { id, name, provider }
}

pub const GEMINI_MODELS: &[Model] = &[
    model("gemini-2.5-flash", "Gemini 2.5 Flash", Provider::Gemini),
    model("gemini-2.0-flash-exp", "Gemini 2.0 Flash (Experimental)", Provider::Gemini),
    model("gemini-1.5-pro-latest", "Gemini 1.5 Pro (Latest)", Provider::Gemini),
    model("gemini-1.5-pro", "Gemini 1.5 Pro", Provider::Gemini),
    model("gemini-1.5-flash-latest", "Gemini 1.5 Flash (Latest)", Provider::Gemini),
    model("gemini-1.5-flash", "Gemini 1.5 Flash", Provider::Gemini),
    model("gemini-pro", "Gemini Pro", Provider::Gemini),
    model("gemini-pro-vision", "Gemini Pro Vision", Provider::Gemini),
];

pub const GPT_MODELS: &[Model] = &[
    model("gpt-4", "GPT-4", Provider::Gpt),
    model("gpt-4-turbo", "GPT-4 Turbo", Provider::Gpt),
    model("gpt-3.5-turbo", "GPT-3.5 Turbo", Provider::Gpt),
];

pub const CLAUDE_MODELS: &[Model] = &[
    model("claude-3-opus", "Claude 3 Opus", Provider::Claude),
    model("claude-3-sonnet", "Claude 3 Sonnet", Provider::Claude),
    model("claude-3-haiku", "Claude 3 Haiku", Provider::Claude),
];

pub fn models_for(provider: Provider) -> &'static [Model] {
    match provider {
        Provider::Gemini => GEMINI_MODELS,
        Provider::Gpt => GPT_MODELS,
        Provider::Claude => CLAUDE_MODELS,
    }
}

pub fn all_models() -> Vec<Model> {
    Provider::ALL
        .iter()
        .flat_map(|p| models_for(*p).iter().copied())
        .collect()
}

/// The model preselected for a provider.
pub fn default_model(provider: Provider) -> Option<&'static Model> {
    models_for(provider).first()
}
