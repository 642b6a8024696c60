use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::{StatusArgs, default_db_path};
use crate::store::{count_rows, load_response, open_store, recent_extractions};
use crate::util::write_json_stdout;

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if !db_path.exists() {
        if args.extraction_id.is_some() {
            bail!("extraction store missing: {}", db_path.display());
        }
        warn!(path = %db_path.display(), "extraction store missing");
        return Ok(());
    }

    let connection = open_store(&db_path)?;

    if let Some(extraction_id) = &args.extraction_id {
        let response = load_response(&connection, extraction_id)?;
        return write_json_stdout(&response);
    }

    let extractions = count_rows(&connection, "SELECT COUNT(*) FROM extractions").unwrap_or(0);
    let documents =
        count_rows(&connection, "SELECT COUNT(DISTINCT sha256) FROM extractions").unwrap_or(0);
    info!(
        path = %db_path.display(),
        extractions = extractions,
        documents = documents,
        "store status"
    );

    for summary in recent_extractions(&connection, args.limit)? {
        info!(
            extraction_id = %summary.extraction_id,
            source = %summary.source_path,
            format = %summary.format,
            extracted_at = %summary.extracted_at,
            fields = summary.field_count,
            meeting_rooms = summary.meeting_room_count,
            hotel_name = %summary.hotel_name.unwrap_or_default(),
            "recent extraction"
        );
    }

    Ok(())
}
