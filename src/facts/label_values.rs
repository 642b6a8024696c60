use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use regex::Regex;

use super::field_guess::ContactPatterns;
use super::numeric::NumberParser;

const FIELD_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "hotel_name",
        &["property name", "hotel name", "hotel", "name", "property", "name of hotel"],
    ),
    ("brand", &["brand", "flag", "chain", "brand affiliation"]),
    (
        "address",
        &["address", "street address", "street", "property address", "address line 1"],
    ),
    ("city", &["city", "town"]),
    ("state", &["state", "province", "state/province"]),
    ("zip", &["zip", "zip code", "zipcode", "postal code", "postcode"]),
    (
        "phone",
        &["phone", "telephone", "tel", "phone number", "main phone", "hotel phone"],
    ),
    ("email", &["email", "e-mail", "email address", "e-mail address"]),
    ("website", &["website", "web site", "url", "web", "web address"]),
    (
        "contact_name",
        &["contact", "contact name", "sales contact", "director of sales", "sales manager"],
    ),
    ("contact_title", &["title", "contact title", "position"]),
    ("contact_email", &["contact email", "sales email"]),
    ("contact_phone", &["contact phone", "sales phone", "direct line", "direct"]),
    (
        "rooms_total",
        &[
            "total rooms",
            "total guest rooms",
            "total guestrooms",
            "guest rooms",
            "guestrooms",
            "number of rooms",
            "number of guest rooms",
            "rooms",
            "sleeping rooms",
        ],
    ),
    ("suites_total", &["suites", "total suites", "number of suites"]),
    (
        "meeting_space_total_sqft",
        &[
            "total meeting space",
            "meeting space",
            "total event space",
            "event space",
            "total function space",
            "function space",
        ],
    ),
    (
        "meeting_rooms_count",
        &["meeting rooms", "number of meeting rooms", "total meeting rooms", "function rooms"],
    ),
    (
        "largest_room_sqft",
        &["largest meeting room", "largest room", "largest space", "ballroom size"],
    ),
    (
        "max_capacity",
        &["max capacity", "maximum capacity", "largest capacity", "capacity"],
    ),
    ("parking", &["parking", "parking type", "parking fee"]),
    ("parking_spaces", &["parking spaces", "number of parking spaces"]),
    ("airport", &["airport", "nearest airport", "closest airport"]),
    (
        "airport_distance_miles",
        &["distance to airport", "airport distance", "miles to airport"],
    ),
    ("check_in", &["check-in", "check in", "check-in time"]),
    ("check_out", &["check-out", "check out", "check-out time"]),
    ("year_built", &["year built", "built", "opened"]),
    (
        "year_renovated",
        &["year renovated", "last renovated", "renovated", "last renovation"],
    ),
];

const NUMERIC_FIELDS: &[&str] = &[
    "rooms_total",
    "suites_total",
    "meeting_space_total_sqft",
    "meeting_rooms_count",
    "largest_room_sqft",
    "max_capacity",
    "parking_spaces",
    "year_built",
    "year_renovated",
];

const FREEFORM_PATTERNS: &[(&str, &str)] = &[
    (
        "meeting_space_total_sqft",
        r"(?i)total\s+(?:meeting|event|function)\s+space\s+(?:of\s+)?(?:over\s+|approximately\s+|nearly\s+)?(\d[\d,]*)\s*(?:sq|square|sf)",
    ),
    (
        "meeting_space_total_sqft",
        r"(?i)(\d[\d,]*)\s*(?:sq\.?\s*(?:ft|feet)\.?|square\s+feet|sf)\s+of\s+(?:total\s+|flexible\s+)?(?:meeting|event|function)\s+space",
    ),
    (
        "rooms_total",
        r"(?i)(\d[\d,]*)\s+(?:guest\s*rooms|guestrooms|sleeping\s+rooms|rooms\s+and\s+suites)",
    ),
    ("suites_total", r"(?i)(\d[\d,]*)\s+(?:luxury\s+|spacious\s+)?suites\b"),
    (
        "meeting_rooms_count",
        r"(?i)(\d+)\s+(?:meeting|function|breakout|event)\s+rooms",
    ),
    (
        "max_capacity",
        r"(?i)(?:accommodat\w*|seat\w*|host\w*)\s+(?:up\s+to\s+)?(\d[\d,]*)\s+(?:guests|people|attendees|persons)",
    ),
    (
        "largest_room_sqft",
        r"(?i)largest\s+(?:meeting\s+)?(?:room|space|ballroom)[^\n\d]{0,30}(\d[\d,]*)\s*(?:sq|square|sf)",
    ),
    ("year_built", r"(?i)\b(?:built|opened)\s+in\s+(\d{4})"),
    ("year_renovated", r"(?i)\brenovated\s+in\s+(\d{4})"),
    (
        "airport_distance_miles",
        r"(?i)(\d+(?:\.\d+)?)\s*(?:miles?|mi\.?)\s+(?:from|to)\s+(?:the\s+)?[^\n]{0,40}?airport",
    ),
    ("hotel_name", r"(?m)^Welcome to (?:the )?([A-Z][^\n,.!]{2,60})"),
];

#[derive(Debug)]
pub struct LabelValueExtractor {
    synonyms: HashMap<String, &'static str>,
    same_line: Regex,
    freeform: Vec<(&'static str, Regex)>,
    dc_quadrant: Regex,
}

impl LabelValueExtractor {
    pub fn new() -> Result<Self> {
        let mut synonyms = HashMap::new();
        for (field, labels) in FIELD_SYNONYMS {
            for label in *labels {
                synonyms.insert(normalize_label(label), *field);
            }
        }

        let freeform = FREEFORM_PATTERNS
            .iter()
            .map(|(field, pattern)| {
                Regex::new(pattern)
                    .with_context(|| format!("failed to compile freeform regex for {field}"))
                    .map(|regex| (*field, regex))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            synonyms,
            same_line: Regex::new(
                r"^(?:•\s*)?(?P<label>[A-Za-z][A-Za-z0-9 /&#.'()\-]{0,60}?)\s*(?::\s*|\s[-–—]\s+)(?P<value>\S.*)$",
            )
            .context("failed to compile label-value regex")?,
            freeform,
            dc_quadrant: Regex::new(
                r"(?i)^(NW|NE|SW|SE)\.?[\s,]+(Washington)(?:\s*,?\s*D\.?\s*C\.?)?$",
            )
            .context("failed to compile DC quadrant regex")?,
        })
    }

    pub fn field_for_label(&self, label: &str) -> Option<&'static str> {
        self.synonyms.get(&normalize_label(label)).copied()
    }

    pub fn parse(
        &self,
        text: &str,
        contacts: &ContactPatterns,
        numbers: &NumberParser,
    ) -> BTreeMap<String, String> {
        let lines = text.lines().map(str::trim).collect::<Vec<&str>>();
        let mut fields = BTreeMap::<String, String>::new();

        self.same_line_pass(&lines, &mut fields);
        self.next_line_pass(&lines, &mut fields);
        self.freeform_pass(text, &mut fields);

        backfill(&mut fields, "email", || contacts.find_email(text));
        backfill(&mut fields, "phone", || contacts.find_phone(text));
        backfill(&mut fields, "website", || contacts.find_website(text));

        coerce_numeric_fields(&mut fields, numbers);
        let mut fields = fields
            .into_iter()
            .map(|(field, value)| (field, value.trim().to_string()))
            .filter(|(_, value)| !value.is_empty())
            .collect::<BTreeMap<String, String>>();
        self.repair_dc_quadrant(&mut fields);

        fields
    }

    fn same_line_pass(&self, lines: &[&str], fields: &mut BTreeMap<String, String>) {
        for line in lines {
            let Some(captures) = self.same_line.captures(line) else {
                continue;
            };
            let (Some(label), Some(value)) = (captures.name("label"), captures.name("value"))
            else {
                continue;
            };
            if let Some(field) = self.field_for_label(label.as_str()) {
                set_if_unset(fields, field, value.as_str());
            }
        }
    }

    fn next_line_pass(&self, lines: &[&str], fields: &mut BTreeMap<String, String>) {
        for (index, line) in lines.iter().enumerate() {
            if line.is_empty() || ends_with_separator(line) {
                continue;
            }
            let Some(field) = self.field_for_label(line) else {
                continue;
            };
            let Some(next) = lines[index + 1..].iter().find(|next| !next.is_empty()) else {
                continue;
            };
            if self.field_for_label(next).is_some() {
                continue;
            }
            set_if_unset(fields, field, next);
        }
    }

    fn freeform_pass(&self, text: &str, fields: &mut BTreeMap<String, String>) {
        for (field, pattern) in &self.freeform {
            if fields.contains_key(*field) {
                continue;
            }
            if let Some(value) = pattern
                .captures(text)
                .and_then(|captures| captures.get(1))
            {
                set_if_unset(fields, field, value.as_str());
            }
        }
    }

    fn repair_dc_quadrant(&self, fields: &mut BTreeMap<String, String>) {
        let Some(city) = fields.get("city") else {
            return;
        };
        let Some(captures) = self.dc_quadrant.captures(city) else {
            return;
        };
        let (Some(quadrant), Some(name)) = (captures.get(1), captures.get(2)) else {
            return;
        };
        let quadrant = quadrant.as_str().to_ascii_uppercase();
        let name = name.as_str().to_string();

        if let Some(address) = fields.get_mut("address") {
            let has_quadrant = address
                .split_whitespace()
                .last()
                .map(|word| word.trim_end_matches('.').eq_ignore_ascii_case(&quadrant))
                .unwrap_or(false);
            if !has_quadrant {
                address.push(' ');
                address.push_str(&quadrant);
            }
        }

        fields.insert("city".to_string(), name);
        fields
            .entry("state".to_string())
            .or_insert_with(|| "DC".to_string());
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .trim_start_matches(['•', '*'])
        .trim_end_matches(|character: char| {
            character.is_whitespace() || matches!(character, '.' | '#' | ':')
        })
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

fn ends_with_separator(line: &str) -> bool {
    line.trim_end().ends_with([':', '-', '–', '—'])
}

fn set_if_unset(fields: &mut BTreeMap<String, String>, field: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() || fields.contains_key(field) {
        return;
    }
    fields.insert(field.to_string(), value.to_string());
}

fn backfill(
    fields: &mut BTreeMap<String, String>,
    field: &str,
    find: impl FnOnce() -> Option<String>,
) {
    if fields.contains_key(field) {
        return;
    }
    if let Some(value) = find() {
        fields.insert(field.to_string(), value);
    }
}

fn coerce_numeric_fields(fields: &mut BTreeMap<String, String>, numbers: &NumberParser) {
    for field in NUMERIC_FIELDS {
        let Some(raw) = fields.get(*field) else {
            continue;
        };
        match numbers.parse_loose_int(raw) {
            Some(value) => {
                fields.insert((*field).to_string(), value.to_string());
            }
            None => {
                fields.remove(*field);
            }
        }
    }
}
