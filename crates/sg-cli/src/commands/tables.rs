//! `sqlguard tables` command: list declared tables

use anyhow::Result;
use sg_analysis::collect_schemas;

use crate::cli::{GlobalArgs, OutputFormat, TablesArgs};
use crate::commands::common;

/// Execute the tables command
pub fn execute(args: &TablesArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let manifest_paths = common::discover_manifests(&args.paths, &config, global)?;
    let files = common::load_manifests(&manifest_paths, global)?;
    let schemas = collect_schemas(&files);

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schemas)?),
        OutputFormat::Text => {
            if schemas.is_empty() {
                println!("No tables declared.");
                return Ok(());
            }

            let rows: Vec<Vec<String>> = schemas
                .iter()
                .flat_map(|schema| {
                    schema.columns.iter().map(move |column| {
                        vec![
                            schema.table_name.to_string(),
                            column.name.clone(),
                            column.descriptor.to_string(),
                            schema.declaration_site(),
                        ]
                    })
                })
                .collect();
            common::print_table(&["TABLE", "COLUMN", "TYPE", "DECLARED AT"], &rows);
            println!("\n{} tables", schemas.len());
        }
    }
    Ok(())
}
