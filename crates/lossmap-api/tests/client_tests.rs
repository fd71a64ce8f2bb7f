// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use lossmap_api::Client;
use std::thread;
use std::time::Duration;
use time::macros::datetime;
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn unreachable_endpoint_yields_actionable_error() {
    let client =
        Client::new("http://127.0.0.1:1", Duration::from_millis(50)).expect("client builds");

    let error = client
        .fetch_counties()
        .expect_err("fetch should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("cannot reach") || message.contains("timed out"));
    assert!(message.contains("127.0.0.1:1"));
}

#[test]
fn fetch_counties_decodes_run_and_rows() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/loss/counties");
        let body = r#"{
            "run": "run_dt=20240101T000000Z",
            "counties": [
                {"fips": "48201", "name": "Harris", "state": "TX",
                 "p50": 2.0, "p90": 9.0, "el_total_sum": 1200.0},
                {"fips": "48113", "name": "Dallas", "el_total_sum": 800.0}
            ]
        }"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let counties = client.fetch_counties()?;
    assert_eq!(counties.run.as_deref(), Some("run_dt=20240101T000000Z"));
    assert_eq!(counties.counties.len(), 2);
    assert_eq!(counties.counties[0].name, "Harris");
    assert_eq!(counties.counties[1].state, "");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn series_request_carries_the_exact_run_qualifier() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let url = request.url().to_owned();
        assert!(url.starts_with("/loss/county?"), "unexpected url {url}");
        assert!(url.contains("fips=48201"), "missing fips in {url}");
        // '=' inside the value is percent-encoded by the query builder.
        assert!(
            url.contains("run=run_dt%3D20240101T000000Z"),
            "missing run qualifier in {url}"
        );
        let body = r#"{
            "fips": "48201",
            "series": [
                {"dt": "2024-01-01 00:00:00+00:00", "el_total": 100.0},
                {"dt": "2024-01-01 03:00:00+00:00", "el_total": 200.0},
                {"dt": "2024-01-01T06:00:00Z", "el_total": 50.0}
            ]
        }"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let series = client.fetch_county_series("48201", Some("run_dt=20240101T000000Z"))?;
    assert_eq!(series.len(), 3);
    assert_eq!(series[0].dt, datetime!(2024-01-01 00:00 UTC));
    assert_eq!(series[2].dt, datetime!(2024-01-01 06:00 UTC));
    assert_eq!(series[1].el_total, 200.0);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn series_request_omits_run_when_absent_and_pads_fips() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let url = request.url().to_owned();
        assert!(url.contains("fips=01001"), "fips not zero-padded in {url}");
        assert!(!url.contains("run="), "unexpected run qualifier in {url}");
        request
            .respond(json_response(r#"{"fips":"01001","series":[]}"#, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let series = client.fetch_county_series("1001", None)?;
    assert!(series.is_empty());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn backend_error_envelope_surfaces_in_message() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"error":"no processed runs yet"}"#, 404))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .fetch_counties()
        .expect_err("404 should surface as error");
    let message = error.to_string();
    assert!(message.contains("404"));
    assert!(message.contains("no processed runs yet"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fetch_top_requests_n_and_decodes_entries() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/loss/top?n=5");
        let body = r#"{
            "run": "run_dt=20240101T000000Z",
            "top": [
                {"geoid": "48201001000", "state": "TX", "county": "Harris",
                 "el_total_sum": 512.5}
            ]
        }"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let top = client.fetch_top(5)?;
    assert_eq!(top.top.len(), 1);
    assert_eq!(top.top[0].county, "Harris");
    assert_eq!(top.top[0].el_total_sum, 512.5);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fetch_bands_uppercases_the_state_filter() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/loss/bands?state=TX");
        let body = r#"{
            "run": "run_dt=20240101T000000Z",
            "count": 1,
            "bands": [{"geoid": "48201001000", "state": "TX", "p50": 1.5, "p90": 9.5}]
        }"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let bands = client.fetch_bands(Some("tx"))?;
    assert_eq!(bands.count, 1);
    assert_eq!(bands.bands[0].p90, 9.5);

    handle.join().expect("server thread should join");
    Ok(())
}
