use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug)]
pub struct NumberParser {
    loose_int: Regex,
    feet_inches: Regex,
    decimal: Regex,
}

impl NumberParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            loose_int: Regex::new(r"-?\d[\d,]*").context("failed to compile loose int regex")?,
            feet_inches: Regex::new(
                r#"(?i)(\d+(?:\.\d+)?)\s*(?:'|ft\.?|feet)\s*(\d+(?:\.\d+)?)\s*(?:"|''|in\b\.?|inches)"#,
            )
            .context("failed to compile feet-inches regex")?,
            decimal: Regex::new(r"-?\d[\d,]*(?:\.\d+)?")
                .context("failed to compile decimal regex")?,
        })
    }

    /// `"1,377"` -> 1377, `"approx. 250 rooms"` -> 250, `"12.5"` -> 12.
    pub fn parse_loose_int(&self, input: &str) -> Option<i64> {
        let found = self.loose_int.find(input)?;
        let digits = found.as_str().replace(',', "");
        digits.parse::<i64>().ok()
    }

    /// `12'` -> 12.0, `12.5'` -> 12.5, `12' 6"` -> 12.5.
    pub fn parse_feet(&self, input: &str) -> Option<f64> {
        if let Some(captures) = self.feet_inches.captures(input) {
            let feet = captures.get(1)?.as_str().parse::<f64>().ok()?;
            let inches = captures.get(2)?.as_str().parse::<f64>().ok()?;
            return Some(feet + inches / 12.0);
        }

        let found = self.decimal.find(input)?;
        found.as_str().replace(',', "").parse::<f64>().ok()
    }
}
