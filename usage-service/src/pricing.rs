//! Versioned pricing table and pure cost calculation.
//!
//! Costs are computed with `rust_decimal::Decimal` so that sub-cent amounts
//! stay exact when summed across thousands of ledger records. An unknown
//! model is a configuration error and must abort the calculation; silently
//! defaulting would corrupt billing.

use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;

/// Per-token rates for a text-generation model.
#[derive(Debug, Clone, Copy)]
pub struct TokenRates {
    pub input_per_token: Decimal,
    pub output_per_token: Decimal,
}

/// Per-image rates for the vision-labeling features applied to every image.
#[derive(Debug, Clone, Copy)]
pub struct VisionRates {
    pub label_detection: Decimal,
    pub web_detection: Decimal,
    pub object_localization: Decimal,
}

impl VisionRates {
    pub fn per_image(&self) -> Decimal {
        self.label_detection + self.web_detection + self.object_localization
    }
}

/// Monetary breakdown of a single billed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBreakdown {
    pub input_cost: Decimal,
    pub output_cost: Decimal,
    pub image_cost: Decimal,
    pub total_cost: Decimal,
}

/// Read-only pricing snapshot. Updating the table affects only records
/// written afterwards; historical ledger rows keep their write-time cost.
#[derive(Debug, Clone)]
pub struct PricingTable {
    pub version: String,
    text_models: HashMap<String, TokenRates>,
    vision: VisionRates,
}

impl PricingTable {
    /// The pricing snapshot currently in force.
    pub fn current() -> Self {
        let mut text_models = HashMap::new();
        // Per-token rates: (USD per 1M tokens) / 1_000_000.
        text_models.insert(
            "textgen-lite-v1".to_string(),
            TokenRates {
                input_per_token: Decimal::new(25, 8),   // $0.25 / 1M
                output_per_token: Decimal::new(125, 8), // $1.25 / 1M
            },
        );
        text_models.insert(
            "textgen-standard-v1".to_string(),
            TokenRates {
                input_per_token: Decimal::new(3, 6),   // $3.00 / 1M
                output_per_token: Decimal::new(15, 6), // $15.00 / 1M
            },
        );
        text_models.insert(
            "textgen-premium-v1".to_string(),
            TokenRates {
                input_per_token: Decimal::new(15, 6),  // $15.00 / 1M
                output_per_token: Decimal::new(75, 6), // $75.00 / 1M
            },
        );

        PricingTable {
            version: "2025-08".to_string(),
            text_models,
            // USD per 1K images.
            vision: VisionRates {
                label_detection: Decimal::new(15, 4),    // $1.50 / 1K
                web_detection: Decimal::new(35, 4),      // $3.50 / 1K
                object_localization: Decimal::new(1, 3), // $1.00 / 1K
            },
        }
    }

    /// Cost of a text-generation call.
    pub fn text_generation_cost(
        &self,
        model: &str,
        input_units: i64,
        output_units: i64,
    ) -> Result<CostBreakdown, AppError> {
        if input_units < 0 || output_units < 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Token counts must be non-negative (got input={}, output={})",
                input_units,
                output_units
            )));
        }

        let rates = self.text_models.get(model).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "Unknown text-generation model '{}' in pricing table version {}",
                model,
                self.version
            ))
        })?;

        let input_cost = Decimal::from(input_units) * rates.input_per_token;
        let output_cost = Decimal::from(output_units) * rates.output_per_token;

        Ok(CostBreakdown {
            input_cost,
            output_cost,
            image_cost: Decimal::ZERO,
            total_cost: input_cost + output_cost,
        })
    }

    /// Cost of a vision-labeling call over one or more images.
    pub fn image_labeling_cost(&self, image_count: i64) -> Result<CostBreakdown, AppError> {
        if image_count < 1 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Image count must be at least 1 (got {})",
                image_count
            )));
        }

        let image_cost = Decimal::from(image_count) * self.vision.per_image();

        Ok(CostBreakdown {
            input_cost: Decimal::ZERO,
            output_cost: Decimal::ZERO,
            image_cost,
            total_cost: image_cost,
        })
    }
}
