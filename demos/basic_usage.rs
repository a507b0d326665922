//! Walks through the main REDCap operations against a real project.
//!
//! This example shows how to:
//! - Configure a context from `REDCAP_HOST` / `REDCAP_TOKEN`
//! - Read the project and its data dictionary
//! - Query records with finder conditions
//! - Create a record and fetch its survey link
//! - Tell transport failures apart from usage errors
//!
//! Run with: `REDCAP_HOST=... REDCAP_TOKEN=... cargo run --example basic_usage`

use redcap::{ConfigOptions, Error, Record, Redcap};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("redcap=debug,basic_usage=info")
        .init();

    let redcap = Redcap::new(ConfigOptions::new());
    let client = redcap.client()?;
    client.set_log(std::env::var("REDCAP_LOG").is_ok());

    println!("=== Project ===");
    let project = client.project().await?;
    println!("Title: {}", project["project_title"]);
    println!("Fields: {:?}", client.fields().await?);
    println!();

    println!("=== Finder ===");
    let patients = redcap.records()?;
    println!("Record count: {}", patients.count().await?);
    println!("Highest id: {}", client.max_id().await?);
    for record in patients.gte(json!({"age": 18})).await? {
        println!("Adult: {:?}", record.id());
    }
    println!();

    println!("=== Usage errors fail before any request ===");
    match patients.gt(json!({"age": "eighteen"})).await {
        Err(e) if e.is_usage_error() => println!("Rejected: {}", e),
        other => println!("Unexpected: {:?}", other),
    }
    match patients.order(json!({"age": "asc"})) {
        Err(Error::Unsupported(op)) => println!("Not supported: {}", op),
        other => println!("Unexpected: {:?}", other),
    }
    println!();

    println!("=== Create ===");
    let mut record = Record::new();
    record.set("first_name", "Ada");
    record.set("last_name", "Lovelace");
    match record.save(&client).await {
        Ok(created) => println!("Saved {:?} (confirmed: {})", record.id(), created),
        Err(Error::HttpError {
            status,
            raw_response,
            ..
        }) => println!("REDCap refused the import ({}): {}", status, raw_response),
        Err(e) => return Err(e),
    }

    if let (Some(id), Ok(instrument)) = (record.id(), std::env::var("REDCAP_INSTRUMENT")) {
        let link = client.survey_link(id, &instrument).await?;
        println!("Survey link: {}", link);
    }

    Ok(())
}
