use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;

use super::numeric::NumberParser;

#[derive(Debug)]
pub struct ContactPatterns {
    pub email: Regex,
    pub phone: Regex,
    pub website: Regex,
}

impl ContactPatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            email: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
                .context("failed to compile email regex")?,
            phone: Regex::new(r"(?:\+?1[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b")
                .context("failed to compile phone regex")?,
            website: Regex::new(r"(?i)\b(?:https?://|www\.)[^\s,;<>()]+")
                .context("failed to compile website regex")?,
        })
    }

    pub fn find_email(&self, text: &str) -> Option<String> {
        self.email.find(text).map(|found| found.as_str().to_string())
    }

    pub fn find_phone(&self, text: &str) -> Option<String> {
        self.phone
            .find(text)
            .map(|found| found.as_str().trim().to_string())
    }

    pub fn find_website(&self, text: &str) -> Option<String> {
        self.website
            .find(text)
            .map(|found| found.as_str().trim_end_matches(['.', ',']).to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuessValue {
    Text,
    Integer,
    Flag,
}

#[derive(Debug)]
struct GuessRule {
    field: &'static str,
    value: GuessValue,
    patterns: Vec<Regex>,
}

#[derive(Debug)]
pub struct FieldGuesser {
    city_state_zip: Regex,
    rules: Vec<GuessRule>,
}

impl FieldGuesser {
    pub fn new() -> Result<Self> {
        let rule = |field: &'static str, value: GuessValue, patterns: &[&str]| -> Result<GuessRule> {
            let patterns = patterns
                .iter()
                .map(|pattern| {
                    Regex::new(pattern)
                        .with_context(|| format!("failed to compile guess regex for {field}"))
                })
                .collect::<Result<Vec<Regex>>>()?;
            Ok(GuessRule {
                field,
                value,
                patterns,
            })
        };

        Ok(Self {
            city_state_zip: Regex::new(
                r"\b([A-Z][A-Za-z.' -]{1,40}?),\s*([A-Z]{2})\.?\s+(\d{5})(?:-\d{4})?\b",
            )
            .context("failed to compile city/state/zip regex")?,
            rules: vec![
                rule(
                    "meeting_space_total_sqft",
                    GuessValue::Integer,
                    &[
                        r"(?i)(\d[\d,]*)\s*(?:sq\.?\s*(?:ft|feet)\.?|square\s+feet|sf\b)\s+(?:of\s+)?(?:total\s+|flexible\s+)?(?:meeting|event|function)",
                        r"(?i)(?:meeting|event|function)\s+space[^\n\d]{0,30}(\d[\d,]*)",
                    ],
                )?,
                rule(
                    "rooms_total",
                    GuessValue::Integer,
                    &[r"(?i)(\d[\d,]*)\s+(?:guest\s*)?rooms\b"],
                )?,
                rule(
                    "largest_room_sqft",
                    GuessValue::Integer,
                    &[
                        r"(?i)ballroom[^\n\d]{0,40}(\d[\d,]*)\s*(?:sq\.?\s*(?:ft|feet)|square\s+f|sf\b)",
                    ],
                )?,
                rule(
                    "max_capacity",
                    GuessValue::Integer,
                    &[
                        r"(?i)(?:max(?:imum)?\.?\s+capacity|capacity\s+of|accommodates?(?:\s+up\s+to)?)\D{0,20}?(\d[\d,]*)",
                    ],
                )?,
                rule(
                    "airport_distance_miles",
                    GuessValue::Text,
                    &[
                        r"(?i)(\d+(?:\.\d+)?)\s*(?:miles?|mi\b\.?)[^\n]{0,40}?\bairport",
                        r"(?i)\bairport[^\n]{0,40}?(\d+(?:\.\d+)?)\s*(?:miles?|mi\b)",
                    ],
                )?,
                rule("has_spa", GuessValue::Flag, &[r"(?i)\bspa\b"])?,
                rule(
                    "has_pool",
                    GuessValue::Flag,
                    &[r"(?i)\b(?:pool|swimming)\b"],
                )?,
                rule(
                    "has_fitness_center",
                    GuessValue::Flag,
                    &[r"(?i)\b(?:gym|fitness\s+(?:center|centre|room|facility))\b"],
                )?,
                rule(
                    "has_business_center",
                    GuessValue::Flag,
                    &[r"(?i)\bbusiness\s+(?:center|centre)\b"],
                )?,
                rule("has_parking", GuessValue::Flag, &[r"(?i)\bparking\b"])?,
            ],
        })
    }

    pub fn guess(
        &self,
        text: &str,
        contacts: &ContactPatterns,
        numbers: &NumberParser,
    ) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::<String, String>::new();

        if let Some(email) = contacts.find_email(text) {
            fields.insert("email".to_string(), email);
        }
        if let Some(phone) = contacts.find_phone(text) {
            fields.insert("phone".to_string(), phone);
        }
        if let Some(website) = contacts.find_website(text) {
            fields.insert("website".to_string(), website);
        }

        if let Some(captures) = self.city_state_zip.captures(text) {
            let parts = [("city", 1), ("state", 2), ("zip", 3)];
            for (field, group) in parts {
                if let Some(value) = captures.get(group) {
                    fields.insert(field.to_string(), value.as_str().trim().to_string());
                }
            }
        }

        for rule in &self.rules {
            if fields.contains_key(rule.field) {
                continue;
            }
            let value = rule
                .patterns
                .iter()
                .find_map(|pattern| guess_value(pattern, text, rule.value, numbers));
            if let Some(value) = value {
                fields.insert(rule.field.to_string(), value);
            }
        }

        fields
    }
}

fn guess_value(
    pattern: &Regex,
    text: &str,
    kind: GuessValue,
    numbers: &NumberParser,
) -> Option<String> {
    match kind {
        GuessValue::Flag => pattern.is_match(text).then(|| "Yes".to_string()),
        GuessValue::Text => pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().trim().to_string()),
        GuessValue::Integer => pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .and_then(|value| numbers.parse_loose_int(value.as_str()))
            .map(|value| value.to_string()),
    }
}
