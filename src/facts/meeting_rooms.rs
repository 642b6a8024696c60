use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::numeric::NumberParser;
use super::token_claims::claim_height_and_area;
use crate::model::{Capacities, Dimensions, HotelFacts, Layout, MeetingRoom};

const MIN_ROOM_NAME_CHARS: usize = 3;
const MIN_TRAILING_TOKENS: usize = 2;

const AREA_UNIT: &str = r"(?:sq\.?\s*(?:ft|feet)\.?|square\s+f(?:ee|oo)t|sf\b)";

#[derive(Debug)]
pub struct MeetingRoomExtractor {
    guestrooms: Regex,
    meeting_space_area_first: Regex,
    meeting_space_label_first: Regex,
    bulleted_row: Regex,
    dimension: Regex,
    not_available: Regex,
    annotation: Regex,
    split_feet_inches: Regex,
}

impl MeetingRoomExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            guestrooms: Regex::new(
                r"(?i)\b(\d[\d,]*)\s+(?:total\s+)?(?:guest\s*rooms?|sleeping\s+rooms?|rooms?)\b",
            )
            .context("failed to compile guestroom total regex")?,
            meeting_space_area_first: Regex::new(&format!(
                r"(?i)(\d[\d,]*)\s*{AREA_UNIT}.*?\b(?:meeting|event)\b.*?\b(?:space|area)s?\b"
            ))
            .context("failed to compile meeting space regex")?,
            meeting_space_label_first: Regex::new(&format!(
                r"(?i)\b(?:meeting|event)\b.*?\b(?:space|area)s?\b.*?(\d[\d,]*)\s*{AREA_UNIT}"
            ))
            .context("failed to compile labelled meeting space regex")?,
            bulleted_row: Regex::new(&format!(
                r"(?i)^(?:[•*\-–—]\s*)?(?P<name>[^\d\s•*\-–—][^\n]*?)\s*[-–—]\s*(?P<sqft>\d[\d,]*)\s*{AREA_UNIT}"
            ))
            .context("failed to compile bulleted room regex")?,
            dimension: Regex::new(
                r#"(?i)(\d+(?:\.\d+)?)\s*(?:'|ft\.?|feet)?(?:\s*\d+(?:\.\d+)?\s*")?\s*[x×]\s*(\d+(?:\.\d+)?)\s*(?:'|ft\.?|feet)?(?:\s*\d+(?:\.\d+)?\s*")?"#,
            )
            .context("failed to compile room dimension regex")?,
            not_available: Regex::new(r"(?i)\bn/a\b").context("failed to compile N/A regex")?,
            annotation: Regex::new(r"\*[A-Za-z][\w-]*|\*")
                .context("failed to compile annotation suffix regex")?,
            split_feet_inches: Regex::new(r#"(\d+(?:\.\d+)?)'\s+(\d+(?:\.\d+)?)""#)
                .context("failed to compile split feet-inches regex")?,
        })
    }

    pub fn extract(&self, text: &str, numbers: &NumberParser) -> HotelFacts {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<&str>>();

        let facts = self.with_overall_stats(HotelFacts::default(), &lines, numbers);
        let facts = self.with_bulleted_rows(facts, &lines, numbers);
        let facts = self.with_dimensioned_rows(facts, &lines, numbers);

        let meeting_rooms = dedupe_rooms(facts.meeting_rooms);
        debug!(
            rooms = meeting_rooms.len(),
            guestrooms = ?facts.total_guestrooms,
            meeting_space = ?facts.total_meeting_space_sqft,
            "extracted meeting-room facts"
        );

        HotelFacts {
            meeting_rooms,
            ..facts
        }
    }

    fn with_overall_stats(
        &self,
        facts: HotelFacts,
        lines: &[&str],
        numbers: &NumberParser,
    ) -> HotelFacts {
        let mut total_guestrooms = facts.total_guestrooms;
        let mut total_meeting_space_sqft = facts.total_meeting_space_sqft;

        for line in lines {
            if total_guestrooms.is_some() && total_meeting_space_sqft.is_some() {
                break;
            }

            if total_guestrooms.is_none()
                && let Some(captures) = self.guestrooms.captures(line)
            {
                total_guestrooms = captures
                    .get(1)
                    .and_then(|value| numbers.parse_loose_int(value.as_str()));
            }

            if total_meeting_space_sqft.is_none() {
                let captures = self
                    .meeting_space_area_first
                    .captures(line)
                    .or_else(|| self.meeting_space_label_first.captures(line));
                if let Some(captures) = captures {
                    total_meeting_space_sqft = captures
                        .get(1)
                        .and_then(|value| numbers.parse_loose_int(value.as_str()));
                }
            }
        }

        HotelFacts {
            total_guestrooms,
            total_meeting_space_sqft,
            ..facts
        }
    }

    fn with_bulleted_rows(
        &self,
        facts: HotelFacts,
        lines: &[&str],
        numbers: &NumberParser,
    ) -> HotelFacts {
        let mut rooms = facts.meeting_rooms;

        for line in lines {
            let Some(captures) = self.bulleted_row.captures(line) else {
                continue;
            };
            let Some(name) = captures.name("name").map(|value| clean_room_name(value.as_str()))
            else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let sqft = captures
                .name("sqft")
                .and_then(|value| numbers.parse_loose_int(value.as_str()));

            let key = name.to_lowercase();
            match rooms.iter_mut().find(|room| room.dedup_key() == key) {
                Some(existing) => {
                    if existing.sqft.is_none() {
                        existing.sqft = sqft;
                    }
                }
                None => rooms.push(MeetingRoom {
                    sqft,
                    ..MeetingRoom::named(name)
                }),
            }
        }

        HotelFacts {
            meeting_rooms: rooms,
            ..facts
        }
    }

    fn with_dimensioned_rows(
        &self,
        facts: HotelFacts,
        lines: &[&str],
        numbers: &NumberParser,
    ) -> HotelFacts {
        let mut rooms = facts.meeting_rooms;

        for line in lines {
            let Some(row) = self.parse_dimensioned_row(line, numbers) else {
                continue;
            };
            rooms = upsert_room(rooms, row);
        }

        HotelFacts {
            meeting_rooms: rooms,
            ..facts
        }
    }

    fn parse_dimensioned_row(&self, line: &str, numbers: &NumberParser) -> Option<MeetingRoom> {
        let found = self.dimension.find(line)?;

        let lead = &line[..found.start()];
        let bulleted = self.bulleted_row.captures(lead);
        let name = match bulleted.as_ref().and_then(|captures| captures.name("name")) {
            Some(value) => clean_room_name(value.as_str()),
            None => clean_room_name(lead),
        };
        if name.chars().count() < MIN_ROOM_NAME_CHARS {
            return None;
        }

        let tokens = self.trailing_tokens(&line[found.end()..]);
        if tokens.len() < MIN_TRAILING_TOKENS {
            return None;
        }

        let claims = claim_height_and_area(&tokens, numbers);
        let inline_sqft = bulleted
            .as_ref()
            .and_then(|captures| captures.name("sqft"))
            .and_then(|value| numbers.parse_loose_int(value.as_str()));
        let (sqft, capacity_start) = match inline_sqft {
            Some(sqft) => (Some(sqft), claims.height.index + 1),
            None => (claims.area.value, claims.capacity_start()),
        };

        let mut capacities = Capacities::default();
        for (layout, token) in Layout::ALL.iter().zip(tokens.iter().skip(capacity_start)) {
            if let Some(value) = numbers.parse_loose_int(token) {
                capacities.set(*layout, value);
            }
        }

        Some(MeetingRoom {
            name,
            dimensions: parse_dimension_pair(found.as_str(), numbers),
            sqft,
            ceiling_ft: claims.height.value,
            capacities,
        })
    }

    fn trailing_tokens(&self, tail: &str) -> Vec<String> {
        let without_markers = self.not_available.replace_all(tail, " ");
        let without_annotations = self.annotation.replace_all(&without_markers, "");
        let joined = self
            .split_feet_inches
            .replace_all(&without_annotations, "$1'$2\"");

        joined
            .split_whitespace()
            .filter(|token| {
                token.chars().any(|character| character.is_ascii_digit())
                    || is_placeholder_token(token)
            })
            .map(ToOwned::to_owned)
            .collect()
    }
}

pub fn dedupe_rooms(rooms: Vec<MeetingRoom>) -> Vec<MeetingRoom> {
    rooms.into_iter().fold(Vec::new(), upsert_room)
}

fn upsert_room(mut rooms: Vec<MeetingRoom>, room: MeetingRoom) -> Vec<MeetingRoom> {
    let key = room.dedup_key();
    match rooms.iter().position(|existing| existing.dedup_key() == key) {
        Some(index) => {
            let existing = rooms.remove(index);
            rooms.insert(index, existing.merged_with(room));
        }
        None => rooms.push(room),
    }
    rooms
}

fn parse_dimension_pair(matched: &str, numbers: &NumberParser) -> Option<Dimensions> {
    let separator = matched.find(['x', 'X', '×'])?;
    let (left, right) = matched.split_at(separator);
    let right = right.trim_start_matches(['x', 'X', '×']);

    Some(Dimensions {
        length_ft: numbers.parse_feet(left)?,
        width_ft: numbers.parse_feet(right)?,
    })
}

fn clean_room_name(raw: &str) -> String {
    raw.trim_start_matches(|character: char| {
        character.is_whitespace() || matches!(character, '•' | '*' | '-' | '–' | '—')
    })
    .trim_end_matches(|character: char| {
        character.is_whitespace() || matches!(character, '-' | '–' | '—' | ':' | '|' | ',')
    })
    .split_whitespace()
    .collect::<Vec<&str>>()
    .join(" ")
}

fn is_placeholder_token(token: &str) -> bool {
    matches!(token, "-" | "–" | "—" | "--")
}
