//! Common test utilities for poke-aggregator integration tests
//!
//! [`MockPokeApi`] stands up a wiremock server that answers the PokeAPI
//! endpoints the aggregator uses, for a small fixed roster.

#![allow(dead_code)]

use poke_aggregator::Config;
use poke_aggregator::config::RetryConfig;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One roster entry: id, name, types in slot order
pub type Entry = (u32, &'static str, &'static [&'static str]);

/// The default roster, in catalog order
pub const ROSTER: &[Entry] = &[
    (1, "bulbasaur", &["grass", "poison"]),
    (4, "charmander", &["fire"]),
    (5, "charmeleon", &["fire"]),
    (6, "charizard", &["fire", "flying"]),
    (7, "squirtle", &["water"]),
    (25, "pikachu", &["electric"]),
    (26, "raichu", &["electric"]),
    (172, "pichu", &["electric"]),
];

/// Mock upstream plus the config pointing at it
pub struct MockPokeApi {
    pub server: MockServer,
}

impl MockPokeApi {
    /// Serve the listing, every detail and the type list for `roster`
    pub async fn start(roster: &[Entry]) -> Self {
        let server = MockServer::start().await;

        let results: Vec<_> = roster
            .iter()
            .map(|(id, name, _)| {
                json!({ "name": name, "url": format!("{}/api/v2/pokemon/{}/", server.uri(), id) })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/v2/pokemon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": roster.len(),
                "next": null,
                "previous": null,
                "results": results,
            })))
            .mount(&server)
            .await;

        for (id, name, types) in roster {
            Mock::given(method("GET"))
                .and(path(format!("/api/v2/pokemon/{}/", name)))
                .respond_with(ResponseTemplate::new(200).set_body_json(detail_json(*id, name, types)))
                .mount(&server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path("/api/v2/type/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 4,
                "results": [
                    { "name": "grass", "url": "https://pokeapi.co/api/v2/type/12/" },
                    { "name": "fire", "url": "https://pokeapi.co/api/v2/type/10/" },
                    { "name": "water", "url": "https://pokeapi.co/api/v2/type/11/" },
                    { "name": "electric", "url": "https://pokeapi.co/api/v2/type/13/" }
                ]
            })))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Register a species record with `(language, text)` descriptions
    pub async fn with_species(&self, id: u32, name: &str, entries: &[(&str, &str)]) {
        let flavor: Vec<_> = entries
            .iter()
            .map(|(lang, text)| json!({ "flavor_text": text, "language": { "name": lang, "url": "" } }))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/api/v2/pokemon-species/{}/", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": name,
                "flavor_text_entries": flavor,
            })))
            .mount(&self.server)
            .await;
    }

    /// Config aimed at this server with fast, deterministic retries
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.upstream.base_url = format!("{}/api/v2/", self.server.uri());
        config.upstream.timeout = Duration::from_secs(5);
        config.upstream.retry = RetryConfig {
            max_attempts: 1,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        config.api.swagger_ui = false;
        config
    }

    /// Number of requests the server received for `request_path`
    pub async fn hits(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == request_path)
            .count()
    }
}

/// PokeAPI-shaped detail payload
pub fn detail_json(id: u32, name: &str, types: &[&str]) -> serde_json::Value {
    let types: Vec<_> = types
        .iter()
        .enumerate()
        .map(|(slot, t)| {
            json!({
                "slot": slot + 1,
                "type": { "name": t, "url": format!("https://pokeapi.co/api/v2/type/{}/", t) }
            })
        })
        .collect();
    json!({
        "id": id,
        "name": name,
        "sprites": { "front_default": format!("https://img.example/{}.png", id) },
        "types": types,
    })
}
