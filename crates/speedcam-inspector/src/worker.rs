//! A single round's measurement work for one selected speed cam.
//!
//! One worker owns one source AS; it polls every measurement point
//! (neighbor) that source has client info for, each on its own task, and
//! folds the raw counter samples into rate samples once the window closes.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::{Duration as ChronoDuration, Utc};
use speedcam_core::measurement::{differentiate, RateSample, RawSample};
use speedcam_core::Ia;

use crate::fetch::fetch_text;
use crate::ingestion::MeasurementPoint;

/// Poll one measurement point's `/metrics` endpoint every `poll_interval`
/// until `duration` has elapsed, collecting a raw sample each time.
///
/// Guarantees at least 2 samples if the endpoint stays reachable and
/// `duration >= poll_interval`. A poll failure aborts this
/// point — it does not retry within the round — and whatever samples were
/// already collected are discarded, since a partial series can't be safely
/// differentiated against a point we never heard from again.
async fn collect_point(
    client: reqwest::Client,
    source: Ia,
    point: MeasurementPoint,
    duration: ChronoDuration,
    poll_interval: StdDuration,
) -> Option<(Ia, Vec<RateSample>)> {
    let start = Utc::now();
    let deadline = start + duration;
    let metrics_url = format!("{}/metrics", point.url());

    let mut samples = Vec::new();
    loop {
        let body = match fetch_text(&client, &metrics_url).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    url = %metrics_url,
                    neighbor = %point.target_isd_as,
                    "measurement point poll failed, abandoning point"
                );
                return None;
            }
        };
        let counters = speedcam_core::metrics_text::parse_border_counters(&body);
        samples.push(RawSample {
            timestamp: Utc::now(),
            bandwidth_in: counters.bandwidth_in.unwrap_or_default(),
            bandwidth_out: counters.bandwidth_out.unwrap_or_default(),
            source,
            neighbor: point.target_isd_as,
        });

        if Utc::now() > deadline {
            break;
        }
        tokio::time::sleep(poll_interval).await;
    }

    match differentiate(&samples) {
        Ok(rates) => Some((point.target_isd_as, rates)),
        Err(err) => {
            tracing::warn!(
                error = %err,
                neighbor = %point.target_isd_as,
                "could not differentiate measurement point samples"
            );
            None
        }
    }
}

/// Run the full worker for `source`: one task per measurement point,
/// collected into a `neighbor -> rate samples` map. A point that errors
/// drops out of the map; the round proceeds with whatever points succeeded.
pub async fn run_worker(
    client: reqwest::Client,
    source: Ia,
    points: Vec<MeasurementPoint>,
    duration: ChronoDuration,
    poll_interval: StdDuration,
) -> HashMap<Ia, Vec<RateSample>> {
    let tasks: Vec<_> = points
        .into_iter()
        .map(|point| {
            let client = client.clone();
            tokio::spawn(collect_point(client, source, point, duration, poll_interval))
        })
        .collect();

    let mut result = HashMap::new();
    for task in tasks {
        match task.await {
            Ok(Some((neighbor, rates))) => {
                result.insert(neighbor, rates);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!(error = %err, "measurement point task panicked");
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn spawn_metrics_responder(in_values: Vec<u64>, out_values: Vec<u64>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for (bw_in, bw_out) in in_values.into_iter().zip(out_values) {
                if let Ok((mut stream, _)) = listener.accept() {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf);
                    let body = format!(
                        "border_input_bytes_total {bw_in}\nborder_output_bytes_total {bw_out}\n"
                    );
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes());
                }
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn collect_point_produces_rate_samples_for_a_reachable_point() {
        let url = spawn_metrics_responder(vec![1000, 1500, 2100], vec![2000, 2800, 3100]);
        let (ip, port) = {
            let rest = url.trim_start_matches("http://");
            let mut parts = rest.split(':');
            (parts.next().unwrap().to_string(), parts.next().unwrap().parse().unwrap())
        };
        let point = MeasurementPoint {
            ip,
            port,
            br_id: "br0".to_string(),
            source_isd_as: "1-1".parse().unwrap(),
            target_isd_as: "1-5".parse().unwrap(),
        };
        let client = crate::fetch::build_client().unwrap();
        // duration < poll_interval: exactly 2 polls happen (one at t=0, the
        // deadline check trips right after the second), matching the
        // responder's 3-reply capacity with room to spare.
        let result = collect_point(
            client,
            "1-1".parse().unwrap(),
            point,
            ChronoDuration::milliseconds(10),
            StdDuration::from_millis(15),
        )
        .await;

        let (neighbor, rates) = result.expect("point should have produced samples");
        assert_eq!(neighbor, "1-5".parse::<Ia>().unwrap());
        assert!(!rates.is_empty());
    }

    #[tokio::test]
    async fn collect_point_abandons_point_on_unreachable_host() {
        let point = MeasurementPoint {
            ip: "127.0.0.1".to_string(),
            port: 1,
            br_id: "br0".to_string(),
            source_isd_as: "1-1".parse().unwrap(),
            target_isd_as: "1-5".parse().unwrap(),
        };
        let client = crate::fetch::build_client().unwrap();
        let result = collect_point(
            client,
            "1-1".parse().unwrap(),
            point,
            ChronoDuration::milliseconds(50),
            StdDuration::from_millis(20),
        )
        .await;
        assert!(result.is_none());
    }
}
