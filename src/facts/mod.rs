use std::collections::BTreeMap;

use anyhow::Result;
use tracing::debug;

use crate::model::{AutofillResponse, HotelFacts};

mod field_guess;
mod label_values;
mod meeting_rooms;
mod normalize;
mod numeric;
mod room_heuristics;
mod token_claims;

use field_guess::{ContactPatterns, FieldGuesser};
use label_values::LabelValueExtractor;
use meeting_rooms::MeetingRoomExtractor;
use normalize::TextNormalizer;
use numeric::NumberParser;
use room_heuristics::fix_room_heuristics;

#[derive(Debug)]
pub struct FactPipeline {
    normalizer: TextNormalizer,
    numbers: NumberParser,
    contacts: ContactPatterns,
    labels: LabelValueExtractor,
    guesser: FieldGuesser,
    rooms: MeetingRoomExtractor,
}

impl FactPipeline {
    pub fn new() -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new()?,
            numbers: NumberParser::new()?,
            contacts: ContactPatterns::new()?,
            labels: LabelValueExtractor::new()?,
            guesser: FieldGuesser::new()?,
            rooms: MeetingRoomExtractor::new()?,
        })
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.normalizer.normalize(raw)
    }

    pub fn parse_labels(&self, text: &str) -> BTreeMap<String, String> {
        self.labels.parse(text, &self.contacts, &self.numbers)
    }

    pub fn guess_fields(&self, text: &str) -> BTreeMap<String, String> {
        self.guesser.guess(text, &self.contacts, &self.numbers)
    }

    pub fn extract_facts(&self, text: &str) -> HotelFacts {
        let facts = self.rooms.extract(text, &self.numbers);
        HotelFacts {
            meeting_rooms: fix_room_heuristics(facts.meeting_rooms),
            ..facts
        }
    }

    pub fn run(&self, raw: &str) -> AutofillResponse {
        let text = self.normalize(raw);
        let guessed = self.guess_fields(&text);
        let labelled = self.parse_labels(&text);
        let facts = self.extract_facts(&text);

        debug!(
            guessed = guessed.len(),
            labelled = labelled.len(),
            meeting_rooms = facts.meeting_rooms.len(),
            "ran fact pipeline"
        );

        let fields = merge_field_sources([
            room_summary_fields(&facts),
            guessed,
            labelled,
            flatten_facts(&facts),
        ]);
        AutofillResponse { fields, facts }
    }
}

pub fn merge_field_sources<I>(sources: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = BTreeMap<String, String>>,
{
    sources
        .into_iter()
        .fold(BTreeMap::new(), |mut merged, source| {
            merged.extend(source);
            merged
        })
}

pub fn flatten_facts(facts: &HotelFacts) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    if let Some(value) = facts.total_guestrooms {
        fields.insert("rooms_total".to_string(), value.to_string());
    }
    if let Some(value) = facts.total_meeting_space_sqft {
        fields.insert("meeting_space_total_sqft".to_string(), value.to_string());
    }

    fields
}

pub fn room_summary_fields(facts: &HotelFacts) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    if !facts.meeting_rooms.is_empty() {
        fields.insert(
            "meeting_rooms_count".to_string(),
            facts.meeting_rooms.len().to_string(),
        );
    }
    if let Some(value) = facts.meeting_rooms.iter().filter_map(|room| room.sqft).max() {
        fields.insert("largest_room_sqft".to_string(), value.to_string());
    }
    if let Some(value) = facts
        .meeting_rooms
        .iter()
        .filter_map(|room| room.capacities.max())
        .max()
    {
        fields.insert("max_capacity".to_string(), value.to_string());
    }

    fields
}
