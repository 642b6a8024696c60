use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelFacts {
    pub total_guestrooms: Option<i64>,
    pub total_meeting_space_sqft: Option<i64>,
    pub meeting_rooms: Vec<MeetingRoom>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_ft: f64,
    pub width_ft: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRoom {
    pub name: String,
    pub dimensions: Option<Dimensions>,
    pub sqft: Option<i64>,
    pub ceiling_ft: Option<f64>,
    #[serde(default)]
    pub capacities: Capacities,
}

impl MeetingRoom {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimensions: None,
            sqft: None,
            ceiling_ft: None,
            capacities: Capacities::default(),
        }
    }

    pub fn dedup_key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn merged_with(self, newer: MeetingRoom) -> MeetingRoom {
        MeetingRoom {
            name: self.name,
            dimensions: newer.dimensions.or(self.dimensions),
            sqft: newer.sqft.or(self.sqft),
            ceiling_ft: newer.ceiling_ft.or(self.ceiling_ft),
            capacities: self.capacities.merged_with(&newer.capacities),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Reception,
    Banquet,
    Theater,
    Schoolroom,
    Conference,
    UShape,
    HollowSquare,
}

impl Layout {
    pub const ALL: [Layout; 7] = [
        Layout::Reception,
        Layout::Banquet,
        Layout::Theater,
        Layout::Schoolroom,
        Layout::Conference,
        Layout::UShape,
        Layout::HollowSquare,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reception: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banquet: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theater: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schoolroom: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub u_shape: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hollow_square: Option<i64>,
}

impl Capacities {
    pub fn get(&self, layout: Layout) -> Option<i64> {
        match layout {
            Layout::Reception => self.reception,
            Layout::Banquet => self.banquet,
            Layout::Theater => self.theater,
            Layout::Schoolroom => self.schoolroom,
            Layout::Conference => self.conference,
            Layout::UShape => self.u_shape,
            Layout::HollowSquare => self.hollow_square,
        }
    }

    pub fn set(&mut self, layout: Layout, value: i64) {
        let slot = match layout {
            Layout::Reception => &mut self.reception,
            Layout::Banquet => &mut self.banquet,
            Layout::Theater => &mut self.theater,
            Layout::Schoolroom => &mut self.schoolroom,
            Layout::Conference => &mut self.conference,
            Layout::UShape => &mut self.u_shape,
            Layout::HollowSquare => &mut self.hollow_square,
        };
        *slot = Some(value);
    }

    pub fn max(&self) -> Option<i64> {
        Layout::ALL
            .iter()
            .filter_map(|layout| self.get(*layout))
            .max()
    }

    pub fn merged_with(&self, newer: &Capacities) -> Capacities {
        let mut merged = self.clone();
        for layout in Layout::ALL {
            if let Some(value) = newer.get(layout) {
                merged.set(layout, value);
            }
        }
        merged
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutofillResponse {
    pub fields: BTreeMap<String, String>,
    pub facts: HotelFacts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub filename: String,
    pub format: String,
    pub size_bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub document_count: usize,
    pub skipped_count: usize,
    pub documents: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftotext: Option<String>,
    pub pdftoppm: Option<String>,
    pub tesseract: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPaths {
    pub source_directory: String,
    pub output_directory: String,
    pub inventory_manifest_path: String,
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchCounts {
    pub document_count: usize,
    pub extracted_count: usize,
    pub unsupported_count: usize,
    pub failed_count: usize,
    pub recorded_count: usize,
    pub meeting_rooms_total: usize,
    pub fields_total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub filename: String,
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: BatchPaths,
    pub counts: BatchCounts,
    pub failures: Vec<BatchFailure>,
    pub warnings: Vec<String>,
}
