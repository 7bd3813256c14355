use comfy_table::presets::ASCII_FULL;
use comfy_table::Table;

use crate::dataset::Dataset;
use crate::error::MlResult;

pub(crate) fn show_string(dataset: &Dataset, n: usize) -> MlResult<String> {
    let rows = dataset.collect()?;
    let mut table = Table::new();
    table.load_preset(ASCII_FULL).set_header(dataset.columns());
    for row in rows.iter().take(n) {
        table.add_row(row.values().iter().map(|v| v.to_string()).collect::<Vec<_>>());
    }
    let mut output = table.to_string();
    if rows.len() > n {
        let noun = if n == 1 { "row" } else { "rows" };
        output.push_str(&format!("\nonly showing top {n} {noun}"));
    }
    Ok(output)
}
