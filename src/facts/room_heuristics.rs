use super::token_claims::MIN_CEILING_FT;
use crate::model::MeetingRoom;

const AREA_COPY_MIN_SQFT: i64 = 400;
const DROPPED_DECIMAL_RANGE: (f64, f64) = (30.0, 150.0);
const MISREAD_CEILING_MIN: f64 = 60.0;
const MISREAD_CEILING_MAX_SQFT: i64 = 200;
const MISREAD_CEILING_FLOOR: f64 = 200.0;
const MAX_PLAUSIBLE_CEILING_FT: f64 = 40.0;

pub fn fix_room_heuristics(rooms: Vec<MeetingRoom>) -> Vec<MeetingRoom> {
    rooms.into_iter().map(fix_room).collect()
}

pub fn fix_room(room: MeetingRoom) -> MeetingRoom {
    let sqft = room.sqft;
    let ceiling = room
        .ceiling_ft
        .and_then(|value| drop_area_copy(value, sqft))
        .map(restore_dropped_decimal)
        .and_then(|value| drop_misread_ceiling(value, sqft))
        .filter(|value| *value <= MAX_PLAUSIBLE_CEILING_FT)
        .filter(|value| *value >= MIN_CEILING_FT);

    MeetingRoom {
        ceiling_ft: ceiling,
        ..room
    }
}

fn drop_area_copy(ceiling: f64, sqft: Option<i64>) -> Option<f64> {
    match sqft {
        Some(area) if area > AREA_COPY_MIN_SQFT && ceiling == area as f64 => None,
        _ => Some(ceiling),
    }
}

fn restore_dropped_decimal(ceiling: f64) -> f64 {
    let (low, high) = DROPPED_DECIMAL_RANGE;
    if (low..=high).contains(&ceiling) {
        ceiling / 10.0
    } else {
        ceiling
    }
}

fn drop_misread_ceiling(ceiling: f64, sqft: Option<i64>) -> Option<f64> {
    let small_area = sqft.is_none_or(|area| area < MISREAD_CEILING_MAX_SQFT);
    if ceiling >= MISREAD_CEILING_MIN && small_area && ceiling > MISREAD_CEILING_FLOOR {
        None
    } else {
        Some(ceiling)
    }
}
