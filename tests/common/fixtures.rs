//! PokeAPI payload fixtures and mock server helpers

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal attributes of a mocked record
pub struct Mon {
    pub id: u32,
    pub species: &'static str,
    pub base_experience: Option<u32>,
    pub height: u32,
    pub weight: u32,
    pub types: &'static [&'static str],
}

/// The first three entries of the real API
pub const STARTERS: [Mon; 3] = [
    Mon {
        id: 1,
        species: "bulbasaur",
        base_experience: Some(64),
        height: 7,
        weight: 69,
        types: &["grass", "poison"],
    },
    Mon {
        id: 2,
        species: "ivysaur",
        base_experience: Some(142),
        height: 10,
        weight: 130,
        types: &["grass", "poison"],
    },
    Mon {
        id: 3,
        species: "venusaur",
        base_experience: Some(263),
        height: 20,
        weight: 1000,
        types: &["grass", "poison"],
    },
];

/// JSON body shaped like `/api/v2/pokemon/{id}`, including fields the decoder ignores
pub fn pokemon_body(mon: &Mon) -> Value {
    let types: Vec<Value> = mon
        .types
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "slot": i + 1,
                "type": {"name": name, "url": format!("https://pokeapi.co/api/v2/type/{name}/")}
            })
        })
        .collect();

    json!({
        "abilities": [],
        "base_experience": mon.base_experience,
        "height": mon.height,
        "id": mon.id,
        "is_default": true,
        "name": mon.species,
        "order": mon.id,
        "species": {
            "name": mon.species,
            "url": format!("https://pokeapi.co/api/v2/pokemon-species/{}/", mon.id)
        },
        "stats": [],
        "types": types,
        "weight": mon.weight,
    })
}

/// Serve `mon` at its record path
pub async fn mount_pokemon(server: &MockServer, mon: &Mon) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/pokemon/{}", mon.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(pokemon_body(mon)))
        .mount(server)
        .await;
}

/// Answer `id` with a bare status code
pub async fn mount_status(server: &MockServer, id: u32, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/pokemon/{id}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Accept ntfy posts on `topic`, expecting exactly `times` of them
pub async fn expect_ntfy_posts(server: &MockServer, topic: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/{topic}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(times)
        .mount(server)
        .await;
}
