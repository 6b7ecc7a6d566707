use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::error::AppResult;
use crate::models::WorkOrderRequest;

const HEADER: [&str; 8] = [
    "division_id",
    "decision_revision",
    "budget_line_id",
    "vendor_id",
    "quote_id",
    "quote_line_item_id",
    "quote_line_item_ids",
    "final_price",
];

/// 将最终授标写为 CSV, 每个预算行一行
pub fn write_work_order_csv<W: Write>(request: &WorkOrderRequest, sink: W) -> AppResult<()> {
    let mut writer = Writer::from_writer(sink);
    writer.write_record(HEADER)?;

    for award in &request.line_awards {
        writer.write_record(&[
            request.division_id.clone(),
            request.decision_revision.to_string(),
            award.budget_line_id.clone(),
            award.vendor_id.clone(),
            award.quote_id.clone(),
            award.quote_line_item_id.clone(),
            award.quote_line_item_ids.join(";"),
            award.final_price.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn work_order_csv_string(request: &WorkOrderRequest) -> AppResult<String> {
    let mut buf = Vec::new();
    write_work_order_csv(request, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn export_work_order_csv(request: &WorkOrderRequest, output_path: &Path) -> AppResult<()> {
    let file = File::create(output_path)?;
    write_work_order_csv(request, file)?;
    tracing::info!(
        "Work order for division {} (revision {}) written to {}",
        request.division_id,
        request.decision_revision,
        output_path.display()
    );
    Ok(())
}
