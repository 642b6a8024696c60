use anyhow::{Context, Result};
use regex::Regex;

pub const BULLET: char = '•';

// U+F0B7 is the private-use bullet Word emits for Symbol-font lists.
const BULLET_VARIANTS: &[char] = &[
    '◦', '▪', '▫', '●', '○', '■', '□', '‣', '∙', '⁃', '·', '\u{F0B7}',
];

#[derive(Debug)]
pub struct TextNormalizer {
    trailing_space: Regex,
    blank_line_run: Regex,
    space_run: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            trailing_space: Regex::new(r"[ \t]+\n")
                .context("failed to compile trailing whitespace regex")?,
            blank_line_run: Regex::new(r"\n{3,}")
                .context("failed to compile blank line run regex")?,
            space_run: Regex::new(r"[ \t]{2,}").context("failed to compile space run regex")?,
        })
    }

    pub fn normalize(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
        let mapped = unified.chars().map(canonical_char).collect::<String>();

        let stripped = self.trailing_space.replace_all(&mapped, "\n");
        let collapsed = self.blank_line_run.replace_all(&stripped, "\n\n");
        let spaced = self.space_run.replace_all(&collapsed, " ");

        spaced.trim().to_string()
    }
}

fn canonical_char(character: char) -> char {
    match character {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '`' | '\u{00B4}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
        '\u{00A0}' | '\u{202F}' | '\u{2007}' => ' ',
        other if BULLET_VARIANTS.contains(&other) => BULLET,
        other => other,
    }
}
