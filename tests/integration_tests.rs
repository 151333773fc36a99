//! Integration tests for riftbot
//!
//! These tests drive the HTTP interactions endpoint end to end:
//! - Signature verification and PING handling
//! - Deferred slash commands completed through the Discord webhook
//! - Complete custom lobby workflows through to the balanced teams
//! - Health, readiness and metrics endpoints

mod fixtures;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use fixtures::{
    profile_storage_with, sign, test_config, DiscordCall, FakeRiotApi, RecordingDiscordApi,
};
use riftbot::discord::MessagePayload;
use riftbot::metrics::MetricsCollector;
use riftbot::profile::ProfileStorage;
use riftbot::service::{create_router, AppState};
use riftbot::types::RiotId;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const TIMESTAMP: &str = "1700000000";

struct TestBot {
    app: AppState,
    router: Router,
    riot: Arc<FakeRiotApi>,
    discord: Arc<RecordingDiscordApi>,
}

fn create_test_bot(riot: FakeRiotApi, profiles: Arc<dyn ProfileStorage>) -> TestBot {
    let riot = Arc::new(riot);
    let discord = Arc::new(RecordingDiscordApi::new());

    let app = AppState::with_components(
        test_config(),
        Arc::new(MetricsCollector::new().unwrap()),
        riot.clone(),
        discord.clone(),
        profiles,
    )
    .unwrap();
    let router = create_router(app.context().clone());

    TestBot {
        app,
        router,
        riot,
        discord,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

/// POST a correctly signed interaction and decode the JSON response
async fn interact(router: &Router, interaction: Value) -> Value {
    let body = interaction.to_string();
    let request = Request::post("/interactions")
        .header("content-type", "application/json")
        .header("x-signature-ed25519", sign(TIMESTAMP, &body))
        .header("x-signature-timestamp", TIMESTAMP)
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

fn slash_command(user: &str, name: &str, options: Value) -> Value {
    json!({
        "id": format!("cmd-{}", name),
        "application_id": "app",
        "type": 2,
        "token": format!("token-{}-{}", name, user),
        "data": {"name": name, "options": options},
        "member": {"user": {"id": user, "username": user}},
        "guild_id": "g1",
        "channel_id": "c1"
    })
}

fn button_press(user: &str, custom_id: &str) -> Value {
    json!({
        "id": format!("btn-{}", user),
        "application_id": "app",
        "type": 3,
        "token": format!("token-button-{}", user),
        "data": {"custom_id": custom_id, "component_type": 2},
        "member": {"user": {"id": user, "username": user}},
        "guild_id": "g1",
        "channel_id": "c1",
        "message": {"id": "lobby-message", "channel_id": "c1"}
    })
}

fn content(response: &Value) -> &str {
    response["data"]["content"].as_str().unwrap_or_default()
}

fn is_ephemeral(response: &Value) -> bool {
    response["data"]["flags"].as_u64().unwrap_or(0) & 64 != 0
}

/// Create a lobby as `host` and return the join, leave and balance button ids
async fn create_lobby(router: &Router, host: &str, max_players: i64) -> [String; 3] {
    let response = interact(
        router,
        slash_command(host, "createlobby", json!([{"name": "maxplayers", "value": max_players}])),
    )
    .await;

    assert_eq!(response["type"], 4);
    assert_eq!(response["data"]["embeds"][0]["title"], "Custom Lobby Created");

    let buttons = &response["data"]["components"][0]["components"];
    [0, 1, 2].map(|i| buttons[i]["custom_id"].as_str().unwrap().to_string())
}

fn embed_title(payload: &MessagePayload) -> Option<&str> {
    payload.embeds.as_ref()?.first()?.title.as_deref()
}

#[tokio::test]
async fn test_ping_requires_valid_signature() {
    let bot = create_test_bot(FakeRiotApi::new(), profile_storage_with(&[]));
    let body = json!({"id": "1", "application_id": "app", "type": 1, "token": "t"}).to_string();

    // No signature headers
    let request = Request::post("/interactions")
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = send(&bot.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signature over a different timestamp
    let request = Request::post("/interactions")
        .header("x-signature-ed25519", sign("1", &body))
        .header("x-signature-timestamp", TIMESTAMP)
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = send(&bot.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = interact(&bot.router, serde_json::from_str(&body).unwrap()).await;
    assert_eq!(response, json!({"type": 1}));
}

#[tokio::test]
async fn test_malformed_interaction_is_bad_request() {
    let bot = create_test_bot(FakeRiotApi::new(), profile_storage_with(&[]));
    let body = "{\"type\": \"nonsense\"}";

    let request = Request::post("/interactions")
        .header("x-signature-ed25519", sign(TIMESTAMP, body))
        .header("x-signature-timestamp", TIMESTAMP)
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&bot.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ranked_info_is_deferred_then_edited() {
    let riot = FakeRiotApi::new();
    riot.add_ranked(&RiotId::new("Faker", "KR1"), "CHALLENGER", "I", 300, 200);
    let bot = create_test_bot(riot, profile_storage_with(&[]));

    let response = interact(
        &bot.router,
        slash_command(
            "u1",
            "rankedinfo",
            json!([
                {"name": "username", "value": "Faker"},
                {"name": "tagline", "value": "KR1"},
                {"name": "region", "value": "kr"}
            ]),
        ),
    )
    .await;
    assert_eq!(response["type"], 5);

    let call = bot
        .discord
        .wait_for(|call| matches!(call, DiscordCall::EditOriginal { .. }))
        .await;
    let DiscordCall::EditOriginal { token, payload } = call else {
        unreachable!()
    };
    assert_eq!(token, "token-rankedinfo-u1");
    let text = payload.content.unwrap();
    assert!(text.starts_with("Ranked Data for Summoner: Faker KR1"));
    assert!(text.contains("Tier: CHALLENGER I (50 LP)"));
    assert!(text.contains("500 Games, 60.00% Winrate"));
    assert!(text.contains("**Flex Queue:** Not available"));

    assert!(bot.riot.calls().contains(&"account kr Faker".to_string()));
}

#[tokio::test]
async fn test_unknown_player_gets_not_found_reply() {
    let bot = create_test_bot(FakeRiotApi::new(), profile_storage_with(&[]));

    interact(
        &bot.router,
        slash_command(
            "u1",
            "summonerinfo",
            json!([
                {"name": "username", "value": "Ghost"},
                {"name": "tagline", "value": "EUW"},
                {"name": "region", "value": "euw"}
            ]),
        ),
    )
    .await;

    let call = bot
        .discord
        .wait_for(|call| matches!(call, DiscordCall::EditOriginal { .. }))
        .await;
    let DiscordCall::EditOriginal { payload, .. } = call else {
        unreachable!()
    };
    assert_eq!(
        payload.content.as_deref(),
        Some(
            "Could not find a player with the username: Ghost and tagline: EUW in the EUW1 region. \
             Please make sure the details are correct."
        )
    );
}

#[tokio::test]
async fn test_setprofile_then_leaderboard() {
    let riot = FakeRiotApi::new();
    riot.add_ranked(&RiotId::new("Gold", "NA1"), "GOLD", "II", 10, 10);
    riot.add_ranked(&RiotId::new("Diamond", "NA1"), "DIAMOND", "IV", 10, 10);
    riot.add_unranked(&RiotId::new("Fresh", "NA1"));
    let profiles = profile_storage_with(&[]);
    let bot = create_test_bot(riot, profiles.clone());

    for (user, name) in [("u1", "Gold"), ("u2", "Diamond"), ("u3", "Fresh")] {
        interact(
            &bot.router,
            slash_command(
                user,
                "setprofile",
                json!([
                    {"name": "username", "value": name},
                    {"name": "tagline", "value": "NA1"},
                    {"name": "region", "value": "na"}
                ]),
            ),
        )
        .await;
        let token = format!("token-setprofile-{}", user);
        bot.discord
            .wait_for(|call| matches!(call, DiscordCall::EditOriginal { token: t, .. } if *t == token))
            .await;
    }
    assert_eq!(profiles.list_profiles().unwrap().len(), 3);

    let response = interact(&bot.router, slash_command("u1", "getprofile", json!([]))).await;
    assert_eq!(content(&response), "Your saved profile: **Gold** NA1 (na1)");

    interact(&bot.router, slash_command("u1", "rankleaderboard", json!([]))).await;
    let call = bot
        .discord
        .wait_for(|call| {
            matches!(call, DiscordCall::EditOriginal { token, .. } if token == "token-rankleaderboard-u1")
        })
        .await;
    let DiscordCall::EditOriginal { payload, .. } = call else {
        unreachable!()
    };
    let embed = &payload.embeds.unwrap()[0];
    assert_eq!(embed.title.as_deref(), Some("Solo/Duo Rank Leaderboard"));

    let board = &embed.fields[0].value;
    let diamond = board.find("<@u2>").unwrap();
    let gold = board.find("<@u1>").unwrap();
    let fresh = board.find("<@u3>").unwrap();
    assert!(diamond < gold && gold < fresh);
}

#[tokio::test]
async fn test_complete_lobby_workflow() {
    let riot = FakeRiotApi::new();
    let players = [
        ("u1", RiotId::new("Iron", "NA1"), "IRON", "IV"),
        ("u2", RiotId::new("Chall", "NA1"), "CHALLENGER", "I"),
        ("u3", RiotId::new("Gold", "NA1"), "GOLD", "II"),
        ("u4", RiotId::new("Silver", "NA1"), "SILVER", "III"),
        ("u5", RiotId::new("Late", "NA1"), "BRONZE", "I"),
    ];
    for (_, riot_id, tier, division) in &players {
        riot.add_ranked(riot_id, tier, division, 20, 20);
    }
    let profiles = profile_storage_with(
        &players
            .iter()
            .map(|(user, riot_id, _, _)| (*user, riot_id))
            .collect::<Vec<_>>(),
    );
    let bot = create_test_bot(riot, profiles);

    let [join, leave, balance] = create_lobby(&bot.router, "host", 4).await;

    // Step 1: four players join
    for (count, (user, ..)) in players.iter().take(4).enumerate() {
        let response = interact(&bot.router, button_press(user, &join)).await;
        assert_eq!(
            content(&response),
            format!("You have joined the lobby. ({}/4)", count + 1)
        );
        assert!(is_ephemeral(&response));
    }

    // The lobby message is refreshed with the player list
    let call = bot
        .discord
        .wait_for(|call| match call {
            DiscordCall::EditMessage { payload, .. } => payload
                .embeds
                .as_ref()
                .is_some_and(|embeds| embeds[0].fields[0].name == "Current Players (4/4)"),
            _ => false,
        })
        .await;
    let DiscordCall::EditMessage {
        channel_id,
        message_id,
        ..
    } = call
    else {
        unreachable!()
    };
    assert_eq!((channel_id.as_str(), message_id.as_str()), ("c1", "lobby-message"));

    // Step 2: the lobby rejects a fifth player and repeated joins
    let response = interact(&bot.router, button_press("u5", &join)).await;
    assert_eq!(content(&response), "Lobby is full.");
    let response = interact(&bot.router, button_press("u1", &join)).await;
    assert_eq!(content(&response), "You are already in the lobby.");

    // Step 3: only the host may balance
    let response = interact(&bot.router, button_press("u1", &balance)).await;
    assert_eq!(content(&response), "Only the lobby creator can balance teams.");

    let response = interact(&bot.router, button_press("host", &balance)).await;
    assert_eq!(response["type"], 4);
    assert!(is_ephemeral(&response));
    assert_eq!(response["data"]["embeds"][0]["title"], "Balancing Teams");

    // Step 4: the balanced teams are posted publicly
    let call = bot
        .discord
        .wait_for(|call| {
            matches!(call, DiscordCall::Followup { payload, .. } if embed_title(payload) == Some("Teams Balanced"))
        })
        .await;
    let DiscordCall::Followup { token, payload } = call else {
        unreachable!()
    };
    assert_eq!(token, "token-button-host");
    assert!(!payload.is_ephemeral());

    let embed = &payload.embeds.unwrap()[0];
    let teams = format!("{}\n{}", embed.fields[0].value, embed.fields[1].value);
    for user in ["u1", "u2", "u3", "u4"] {
        assert_eq!(teams.matches(&format!("<@{}>", user)).count(), 1);
    }
    assert!(teams.contains("<@u3> (GOLD II, 50 LP)"));

    // Iron + Challenger (1075) against Gold + Silver (775)
    let footer = &embed.footer.as_ref().unwrap().text;
    assert!(footer.contains("Difference: 300"), "footer: {}", footer);

    // Step 5: leaving frees a slot again
    let response = interact(&bot.router, button_press("u4", &leave)).await;
    assert_eq!(content(&response), "You have left the lobby.");
    let response = interact(&bot.router, button_press("u4", &leave)).await;
    assert_eq!(content(&response), "You are not in this lobby.");
    let response = interact(&bot.router, button_press("u5", &join)).await;
    assert_eq!(content(&response), "You have joined the lobby. (4/4)");

    // The balancing task records its result after posting the teams
    let mut stats = bot.app.lobby_manager().get_stats().await.unwrap();
    for _ in 0..200 {
        if stats.teams_balanced == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        stats = bot.app.lobby_manager().get_stats().await.unwrap();
    }
    assert_eq!(stats.lobbies_created, 1);
    assert_eq!(stats.teams_balanced, 1);
}

#[tokio::test]
async fn test_join_requires_profile() {
    let bot = create_test_bot(FakeRiotApi::new(), profile_storage_with(&[]));
    let [join, ..] = create_lobby(&bot.router, "host", 10).await;

    let response = interact(&bot.router, button_press("stranger", &join)).await;
    assert!(content(&response).starts_with("You do not have a linked Riot account."));
    assert!(is_ephemeral(&response));
}

#[tokio::test]
async fn test_balance_skips_players_whose_lookup_fails() {
    let riot = FakeRiotApi::new();
    let ids = [
        ("u1", RiotId::new("One", "NA1")),
        ("u2", RiotId::new("Two", "NA1")),
        ("u3", RiotId::new("Three", "NA1")),
    ];
    riot.add_ranked(&ids[0].1, "GOLD", "I", 5, 5);
    riot.add_unranked(&ids[1].1);
    riot.add_ranked(&ids[2].1, "PLATINUM", "IV", 5, 5);
    riot.break_player(&ids[2].1);
    let profiles = profile_storage_with(&ids.iter().map(|(u, r)| (*u, r)).collect::<Vec<_>>());
    let bot = create_test_bot(riot, profiles);

    let [join, _, balance] = create_lobby(&bot.router, "u1", 10).await;
    for (user, _) in &ids {
        interact(&bot.router, button_press(user, &join)).await;
    }
    interact(&bot.router, button_press("u1", &balance)).await;

    let call = bot
        .discord
        .wait_for(|call| matches!(call, DiscordCall::Followup { .. }))
        .await;
    let DiscordCall::Followup { payload, .. } = call else {
        unreachable!()
    };
    let embed = &payload.embeds.unwrap()[0];
    assert_eq!(embed.title.as_deref(), Some("Teams Balanced"));
    assert!(embed
        .fields
        .iter()
        .any(|field| field.name == "Skipped Players" && field.value == "<@u3>"));
    assert!(embed
        .footer
        .as_ref()
        .unwrap()
        .text
        .contains("Skipped (rank lookup failed): 1 player(s)"));
    assert!(embed.fields[0].value.contains("Unranked, 0 Games") || embed.fields[1].value.contains("Unranked, 0 Games"));
}

#[tokio::test]
async fn test_balance_with_too_few_valid_players() {
    let riot = FakeRiotApi::new();
    let good = RiotId::new("Good", "NA1");
    let bad = RiotId::new("Bad", "NA1");
    riot.add_ranked(&good, "GOLD", "I", 5, 5);
    riot.add_ranked(&bad, "GOLD", "I", 5, 5);
    riot.break_player(&bad);
    let bot = create_test_bot(riot, profile_storage_with(&[("u1", &good), ("u2", &bad)]));

    let [join, _, balance] = create_lobby(&bot.router, "u1", 10).await;
    interact(&bot.router, button_press("u1", &join)).await;
    interact(&bot.router, button_press("u2", &join)).await;
    interact(&bot.router, button_press("u1", &balance)).await;

    let call = bot
        .discord
        .wait_for(|call| matches!(call, DiscordCall::Followup { .. }))
        .await;
    let DiscordCall::Followup { payload, .. } = call else {
        unreachable!()
    };
    assert_eq!(
        payload.content.as_deref(),
        Some("Not enough valid players to balance teams.")
    );
    assert!(payload.is_ephemeral());

    // The lobby is open again for another attempt
    let lobby_id = riftbot::discord::commands::parse_custom_id(&balance).unwrap().1;
    let mut reopened = false;
    for _ in 0..200 {
        let lobby = bot.app.lobby_manager().get_lobby(lobby_id).await.unwrap().unwrap();
        if lobby.state() == riftbot::lobby::LobbyState::Open {
            reopened = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(reopened);
}

#[tokio::test]
async fn test_expired_lobby_button() {
    let bot = create_test_bot(FakeRiotApi::new(), profile_storage_with(&[]));
    let custom_id = format!("join:{}", riftbot::utils::generate_lobby_id());

    let response = interact(&bot.router, button_press("u1", &custom_id)).await;
    assert_eq!(content(&response), "This lobby no longer exists.");
    assert!(is_ephemeral(&response));
}

#[tokio::test]
async fn test_health_and_metrics_endpoints() {
    let bot = create_test_bot(FakeRiotApi::new(), profile_storage_with(&[]));

    let (status, _) = send(&bot.router, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    *bot.app.context().is_running.write().await = true;

    let (status, body) = send(&bot.router, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "riftbot-test");

    let (status, body) = send(&bot.router, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Ready");

    create_lobby(&bot.router, "host", 6).await;

    let (status, body) = send(&bot.router, Request::get("/stats").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let stats: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats["lobbies"]["active"], 1);
    assert_eq!(stats["lobbies"]["created"], 1);

    let (status, body) = send(&bot.router, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("riftbot_lobbies_created_total 1"));
    assert!(text.contains("riftbot_interactions_total"));
}
