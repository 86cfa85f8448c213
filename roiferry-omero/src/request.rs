// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, redirect::Policy};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// OMERO.web JSON API root
pub const API_ROOT: &str = "api/v0";

pub fn create_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("roiferry/", env!("CARGO_PKG_VERSION")))
        .cookie_store(true)
        .redirect(Policy::limited(10))
        .build()
        .context("Failed to create HTTP client")
}

/// Fetch the CSRF token that must accompany every write request
pub async fn fetch_csrf_token(client: &Client, base_url: &str) -> Result<String> {
    let body: Value = get_json(client, &format!("{}/{}/token/", base_url, API_ROOT), &[]).await?;

    body.get("data")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No CSRF token in response"))
}

/// Identifier of the first OMERO.server the web instance is connected to
pub async fn fetch_server_id(client: &Client, base_url: &str) -> Result<i64> {
    let body: Value =
        get_json(client, &format!("{}/{}/servers/", base_url, API_ROOT), &[]).await?;

    body.get("data")
        .and_then(Value::as_array)
        .and_then(|servers| servers.first())
        .and_then(|server| server.get("id"))
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("No OMERO.server listed by {}", base_url))
}

/// Log in with a username and password, storing the session cookie
pub async fn login(
    client: &Client,
    base_url: &str,
    csrf_token: &str,
    username: &str,
    password: &str,
) -> Result<()> {
    let server = fetch_server_id(client, base_url).await?.to_string();

    let resp = client
        .post(format!("{}/{}/login/", base_url, API_ROOT))
        .header("X-CSRFToken", csrf_token)
        .header("Referer", base_url)
        .form(&[
            ("username", username),
            ("password", password),
            ("server", server.as_str()),
        ])
        .send()
        .await
        .context("Failed to send login request")?;

    let status = resp.status();
    let body: Value = resp.json().await.context("Failed to parse login response")?;

    if !status.is_success() || body.get("success").and_then(Value::as_bool) != Some(true) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown reason");
        return Err(anyhow!("Login as {} failed: {}", username, message));
    }

    Ok(())
}

pub async fn logout(client: &Client, base_url: &str, csrf_token: &str) -> Result<()> {
    client
        .post(format!("{}/webclient/logout/", base_url))
        .header("X-CSRFToken", csrf_token)
        .header("Referer", base_url)
        .send()
        .await
        .context("Failed to send logout request")?
        .error_for_status()
        .context("Logout was rejected")?;

    Ok(())
}

pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T> {
    client
        .get(url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", url))?
        .error_for_status()
        .with_context(|| format!("Request to {} was rejected", url))?
        .json::<T>()
        .await
        .with_context(|| format!("Failed to parse response from {}", url))
}

pub async fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let bytes = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", url))?
        .error_for_status()
        .with_context(|| format!("Request to {} was rejected", url))?
        .bytes()
        .await
        .context("Failed to read response body")?;

    Ok(bytes.to_vec())
}

pub async fn post_json(
    client: &Client,
    url: &str,
    csrf_token: &str,
    referer: &str,
    query: &[(&str, String)],
    body: &Value,
) -> Result<Value> {
    client
        .post(url)
        .query(query)
        .header("X-CSRFToken", csrf_token)
        .header("Referer", referer)
        .json(body)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", url))?
        .error_for_status()
        .with_context(|| format!("Request to {} was rejected", url))?
        .json::<Value>()
        .await
        .with_context(|| format!("Failed to parse response from {}", url))
}
