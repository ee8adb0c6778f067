//! Output formatter for tool results
//!
//! Turns raw tool text into the answer shown to the user, keyed on the name
//! of the operation that produced it.

use crate::tools::{ToolDescriptor, ToolInvocation, ToolOutput};

/// Prefix shared by the BMI calculation operations
pub const BMI_OPERATION_PREFIX: &str = "calculate_bmi";
pub const FORECAST_OPERATION: &str = "get_forecast";
pub const ALERTS_OPERATION: &str = "get_alerts";

/// Kind of answer rendering selected from the operation name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Bmi,
    Forecast,
    Alerts,
    Generic,
}

impl OutputKind {
    pub fn for_operation(name: &str) -> Self {
        if name.starts_with(BMI_OPERATION_PREFIX) {
            OutputKind::Bmi
        } else if name == FORECAST_OPERATION {
            OutputKind::Forecast
        } else if name == ALERTS_OPERATION {
            OutputKind::Alerts
        } else {
            OutputKind::Generic
        }
    }
}

/// Unified formatter for tool answers
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolOutputFormatter;

impl ToolOutputFormatter {
    /// Create a new formatter instance
    pub fn new() -> Self {
        Self
    }

    /// Render the answer for a completed invocation
    pub fn format_answer(&self, invocation: &ToolInvocation, output: &ToolOutput) -> String {
        let result = output.text.trim();

        match OutputKind::for_operation(&invocation.tool) {
            OutputKind::Bmi => {
                let args = &invocation.arguments;
                match (args.display("weight_kg"), args.display("height_m")) {
                    (Some(weight), Some(height)) => format!(
                        "BMI for weight {}kg and height {}m is {}",
                        weight, height, result
                    ),
                    _ => format!("Result: {}", result),
                }
            }
            OutputKind::Forecast => format!("Weather forecast:\n{}", result),
            OutputKind::Alerts => format!("Weather alerts:\n{}", result),
            OutputKind::Generic => format!("Result: {}", result),
        }
    }

    /// One line summary of an operation for listings
    pub fn format_operation(&self, descriptor: &ToolDescriptor) -> String {
        let summary = descriptor
            .description
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");

        if summary.is_empty() {
            descriptor.name.clone()
        } else {
            format!("{} - {}", descriptor.name, summary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::validate_arguments;
    use serde_json::json;

    fn invocation(tool: &str, raw: serde_json::Value) -> ToolInvocation {
        let arguments = validate_arguments(&json!({"type": "object"}), &raw).unwrap();
        ToolInvocation::new(tool, arguments)
    }

    #[test]
    fn test_bmi_answer() {
        let formatter = ToolOutputFormatter::new();
        let answer = formatter.format_answer(
            &invocation("calculate_bmi", json!({"weight_kg": 70, "height_m": 1.75})),
            &ToolOutput::new("22.86"),
        );
        assert_eq!(answer, "BMI for weight 70kg and height 1.75m is 22.86");
    }

    #[test]
    fn test_bmi_prefix_and_missing_arguments() {
        let formatter = ToolOutputFormatter::new();
        let answer = formatter.format_answer(
            &invocation("calculate_bmi_metric", json!({"weight_kg": "80", "height_m": "1.8"})),
            &ToolOutput::new("24.69"),
        );
        assert_eq!(answer, "BMI for weight 80kg and height 1.8m is 24.69");

        let answer = formatter.format_answer(
            &invocation("calculate_bmi", json!({"weight_kg": 70})),
            &ToolOutput::new("22.86"),
        );
        assert_eq!(answer, "Result: 22.86");
    }

    #[test]
    fn test_weather_answers() {
        let formatter = ToolOutputFormatter::new();
        let forecast = formatter.format_answer(
            &invocation("get_forecast", json!({"latitude": 40.7, "longitude": -74.0})),
            &ToolOutput::new("Sunny, 70F"),
        );
        assert_eq!(forecast, "Weather forecast:\nSunny, 70F");

        let alerts = formatter.format_answer(
            &invocation("get_alerts", json!({"state": "NY"})),
            &ToolOutput::new("No active alerts\n"),
        );
        assert_eq!(alerts, "Weather alerts:\nNo active alerts");
    }

    #[test]
    fn test_other_operations_are_generic() {
        let formatter = ToolOutputFormatter::new();
        let answer =
            formatter.format_answer(&invocation("convert_units", json!({})), &ToolOutput::new("42"));
        assert_eq!(answer, "Result: 42");
        assert_eq!(OutputKind::for_operation("get_forecast_hourly"), OutputKind::Generic);
    }

    #[test]
    fn test_operation_summary() {
        let formatter = ToolOutputFormatter::new();
        let descriptor = ToolDescriptor::new(
            "get_alerts",
            "\n    Get weather alerts for a US state.\n\n    Args: state",
            json!({}),
        );
        assert_eq!(
            formatter.format_operation(&descriptor),
            "get_alerts - Get weather alerts for a US state."
        );
        let bare = ToolDescriptor::new("ping", "", json!({}));
        assert_eq!(formatter.format_operation(&bare), "ping");
    }
}
