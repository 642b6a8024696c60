use super::numeric::NumberParser;

pub const MIN_CEILING_FT: f64 = 6.0;
pub const MAX_CEILING_FT: f64 = 45.0;
pub const MIN_ROOM_SQFT: i64 = 200;

const CLAIM_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenClaim<T> {
    pub index: usize,
    pub value: Option<T>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenClaims {
    pub height: TokenClaim<f64>,
    pub area: TokenClaim<i64>,
}

impl TokenClaims {
    pub fn capacity_start(&self) -> usize {
        self.height.index.max(self.area.index) + 1
    }
}

pub fn claim_height_and_area(tokens: &[String], numbers: &NumberParser) -> TokenClaims {
    let window = &tokens[..tokens.len().min(CLAIM_WINDOW)];

    let height_index = window
        .iter()
        .position(|token| {
            numbers
                .parse_feet(token)
                .map(|value| (MIN_CEILING_FT..=MAX_CEILING_FT).contains(&value))
                .unwrap_or(false)
        })
        .unwrap_or(0);

    let area_index = window
        .iter()
        .position(|token| {
            numbers
                .parse_loose_int(token)
                .map(|value| value >= MIN_ROOM_SQFT)
                .unwrap_or(false)
        })
        .unwrap_or(1);

    TokenClaims {
        height: TokenClaim {
            index: height_index,
            value: tokens
                .get(height_index)
                .and_then(|token| numbers.parse_feet(token)),
        },
        area: TokenClaim {
            index: area_index,
            value: tokens
                .get(area_index)
                .and_then(|token| numbers.parse_loose_int(token)),
        },
    }
}
