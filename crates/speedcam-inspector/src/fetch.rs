//! A shared outbound HTTP client, tuned the way the algorithm's original
//! implementation tuned its own: a 2-second timeout and a fixed User-Agent, so
//! a single unreachable neighbor can't stall a whole inspection round.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::Error;

const USER_AGENT: &str = "speedcam-inspector";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Build the client used for every outbound request this daemon makes.
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
}

/// GET `url` and return the response body as text.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// GET `url` and deserialize the response body as JSON.
pub async fn fetch_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T, Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json::<T>().await?)
}
