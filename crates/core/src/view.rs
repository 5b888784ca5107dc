use crate::domain::rating::RatingLabel;
use crate::domain::row::RECOMMEND_ALL;
use anyhow::Context;
use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;
use std::path::Path;

pub const TRADINGVIEW_DATA_TEMPLATE: &str = "tradingview_data.html";

const BUNDLED_TRADINGVIEW_DATA: &str = include_str!("../templates/tradingview_data.html");

pub trait ViewRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> anyhow::Result<String>;
}

fn rating_css_class(label: RatingLabel) -> &'static str {
    match label {
        RatingLabel::StrongSell => "rating-strong-sell",
        RatingLabel::Sell => "rating-sell",
        RatingLabel::Neutral => "rating-neutral",
        RatingLabel::Buy => "rating-buy",
        RatingLabel::StrongBuy => "rating-strong-buy",
    }
}

// Only the rating column is styled; other cells may hold label-like text.
handlebars_helper!(rating_class: |column: str, value: Json| {
    value
        .as_str()
        .filter(|_| column == RECOMMEND_ALL)
        .and_then(|s| s.parse::<RatingLabel>().ok())
        .map(rating_css_class)
        .unwrap_or("")
});

pub struct HandlebarsViews {
    registry: Handlebars<'static>,
}

impl HandlebarsViews {
    /// Registry with the templates compiled into the binary.
    pub fn bundled() -> anyhow::Result<Self> {
        let mut registry = Self::registry();
        registry
            .register_template_string(TRADINGVIEW_DATA_TEMPLATE, BUNDLED_TRADINGVIEW_DATA)
            .context("bundled tradingview_data.html template is invalid")?;
        Ok(Self { registry })
    }

    /// Registry reading templates from `dir`, for local overrides of the bundled markup.
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let mut registry = Self::registry();
        let path = dir.join(TRADINGVIEW_DATA_TEMPLATE);
        registry
            .register_template_file(TRADINGVIEW_DATA_TEMPLATE, &path)
            .with_context(|| format!("failed to load template {}", path.display()))?;
        Ok(Self { registry })
    }

    pub fn from_settings(settings: &crate::config::Settings) -> anyhow::Result<Self> {
        match settings.templates_dir.as_deref() {
            Some(dir) => Self::from_dir(dir),
            None => Self::bundled(),
        }
    }

    fn registry() -> Handlebars<'static> {
        let mut registry = Handlebars::new();
        registry.register_helper("rating_class", Box::new(rating_class));
        registry
    }
}

impl ViewRenderer for HandlebarsViews {
    fn render(&self, template: &str, context: &Value) -> anyhow::Result<String> {
        self.registry
            .render(template, context)
            .with_context(|| format!("failed to render template {template}"))
    }
}
