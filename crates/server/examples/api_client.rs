//! Walk a running docproxy through one document's lifecycle

use reqwest::Client;
use serde_json::{json, Value};

const SERVER_URL: &str = "http://localhost:4051";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();

    // Example 1: Health check
    println!("1. Health Check:");
    let resp = client.get(format!("{SERVER_URL}/health")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 2: Create a widget with a generated id
    println!("2. Create Widget:");
    let resp = client
        .post(format!("{SERVER_URL}/widget"))
        .json(&json!({ "color": "red", "size": 3 }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    let created: Value = resp.json().await?;
    println!("Body: {created}");
    println!();

    let Some(id) = created["data"]["id"].as_str().map(str::to_owned) else {
        anyhow::bail!("create did not return an id: {created}");
    };

    // Example 3: Fetch it back
    println!("3. Get Widget:");
    let resp = client
        .get(format!("{SERVER_URL}/widget/{id}"))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 4: Merge a change
    println!("4. Update Widget:");
    let resp = client
        .put(format!("{SERVER_URL}/widget/{id}"))
        .json(&json!({ "color": "blue" }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 5: List the first page
    println!("5. List Widgets:");
    let resp = client
        .get(format!("{SERVER_URL}/widget"))
        .query(&[("page", "1"), ("amount", "10")])
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 6: Delete returns the document as it was
    println!("6. Delete Widget:");
    let resp = client
        .delete(format!("{SERVER_URL}/widget/{id}"))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 7: Gone now
    println!("7. Get Deleted Widget:");
    let resp = client
        .get(format!("{SERVER_URL}/widget/{id}"))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);

    Ok(())
}
