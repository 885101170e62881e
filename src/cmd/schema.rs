//! JSON schema command CLI handler.

use crate::json_schema;

pub fn run(name: Option<String>) -> anyhow::Result<()> {
    match name {
        Some(name) => match json_schema::get_schema(&name) {
            Some(schema) => {
                println!("{}", serde_json::to_string_pretty(&schema)?);
                Ok(())
            }
            None => anyhow::bail!(
                "unknown schema '{}'. Available schemas: {}",
                name,
                json_schema::schema_names().join(", ")
            ),
        },
        None => {
            let schemas = json_schema::all_schemas();
            println!("{}", serde_json::to_string_pretty(&schemas)?);
            Ok(())
        }
    }
}
