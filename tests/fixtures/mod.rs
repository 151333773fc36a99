//! Test fixtures and fake implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use riftbot::config::{AppConfig, ProfileStorageKind};
use riftbot::discord::{CommandDefinition, DiscordApi, MessagePayload};
use riftbot::error::{BotError, Result};
use riftbot::profile::{InMemoryProfileStorage, LeagueProfile, ProfileStorage};
use riftbot::riot::{
    Account, ChampionMastery, ChampionNames, CurrentGame, LeagueEntry, PlatformRegion,
    RankedQueues, RiotApi, Summoner,
};
use riftbot::types::RiotId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SIGNING_SEED: [u8; 32] = [42u8; 32];

/// One player known to the fake Riot API
#[derive(Debug, Clone)]
pub struct FakePlayer {
    pub puuid: String,
    pub queues: RankedQueues,
}

/// In-memory Riot API keyed by Riot ID
#[derive(Default)]
pub struct FakeRiotApi {
    players: Mutex<HashMap<RiotId, FakePlayer>>,
    /// PUUIDs whose league lookups fail with a 503
    broken: Mutex<Vec<String>>,
    games: Mutex<HashMap<String, CurrentGame>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRiotApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a solo/duo ranked player
    pub fn add_ranked(&self, riot_id: &RiotId, tier: &str, division: &str, wins: u32, losses: u32) {
        let queues = RankedQueues {
            solo: Some(solo_entry(tier, division, wins, losses)),
            flex: None,
        };
        self.add_player(riot_id, queues);
    }

    pub fn add_unranked(&self, riot_id: &RiotId) {
        self.add_player(riot_id, RankedQueues::default());
    }

    pub fn add_player(&self, riot_id: &RiotId, queues: RankedQueues) {
        let puuid = format!("puuid-{}", riot_id.game_name.to_lowercase());
        self.players
            .lock()
            .unwrap()
            .insert(riot_id.clone(), FakePlayer { puuid, queues });
    }

    /// Make the league lookup of this player fail
    pub fn break_player(&self, riot_id: &RiotId) {
        let puuid = self.players.lock().unwrap()[riot_id].puuid.clone();
        self.broken.lock().unwrap().push(puuid);
    }

    pub fn set_game(&self, puuid: &str, game: CurrentGame) {
        self.games.lock().unwrap().insert(puuid.to_string(), game);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn queues_for(&self, puuid: &str) -> Option<RankedQueues> {
        self.players
            .lock()
            .unwrap()
            .values()
            .find(|player| player.puuid == puuid)
            .map(|player| player.queues.clone())
    }
}

fn not_found() -> anyhow::Error {
    BotError::RiotApi {
        status: 404,
        message: "Data not found".to_string(),
    }
    .into()
}

pub fn solo_entry(tier: &str, division: &str, wins: u32, losses: u32) -> LeagueEntry {
    LeagueEntry {
        queue_type: "RANKED_SOLO_5x5".to_string(),
        tier: tier.to_string(),
        rank: division.to_string(),
        league_points: 50,
        wins,
        losses,
    }
}

#[async_trait]
impl RiotApi for FakeRiotApi {
    async fn account_by_riot_id(&self, region: PlatformRegion, riot_id: &RiotId) -> Result<Account> {
        self.record(format!("account {} {}", region, riot_id.game_name));
        let players = self.players.lock().unwrap();
        let player = players.get(riot_id).ok_or_else(not_found)?;
        Ok(Account {
            puuid: player.puuid.clone(),
            game_name: Some(riot_id.game_name.clone()),
            tag_line: Some(riot_id.tag_line.clone()),
        })
    }

    async fn summoner_by_puuid(&self, _region: PlatformRegion, puuid: &str) -> Result<Summoner> {
        Ok(Summoner {
            id: None,
            account_id: None,
            puuid: puuid.to_string(),
            profile_icon_id: 4568,
            revision_date: 1_700_000_000_000,
            summoner_level: 321,
        })
    }

    async fn league_entries_by_summoner(
        &self,
        _region: PlatformRegion,
        _summoner_id: &str,
    ) -> Result<RankedQueues> {
        Err(not_found())
    }

    async fn league_entries_by_puuid(
        &self,
        _region: PlatformRegion,
        puuid: &str,
    ) -> Result<RankedQueues> {
        self.record(format!("league {}", puuid));
        if self.broken.lock().unwrap().iter().any(|p| p == puuid) {
            return Err(BotError::RiotApi {
                status: 503,
                message: "Service Unavailable".to_string(),
            }
            .into());
        }
        Ok(self.queues_for(puuid).unwrap_or_default())
    }

    async fn champion_masteries(
        &self,
        _region: PlatformRegion,
        _puuid: &str,
    ) -> Result<Vec<ChampionMastery>> {
        Ok(vec![
            ChampionMastery {
                champion_id: 103,
                champion_level: 7,
                champion_points: 250_000,
            },
            ChampionMastery {
                champion_id: 157,
                champion_level: 5,
                champion_points: 48_000,
            },
        ])
    }

    async fn top_champion_masteries(
        &self,
        region: PlatformRegion,
        puuid: &str,
        count: u32,
    ) -> Result<Vec<ChampionMastery>> {
        let mut masteries = self.champion_masteries(region, puuid).await?;
        masteries.truncate(count as usize);
        Ok(masteries)
    }

    async fn active_game(&self, _region: PlatformRegion, puuid: &str) -> Result<Option<CurrentGame>> {
        Ok(self.games.lock().unwrap().get(puuid).cloned())
    }

    async fn champion_names(&self) -> Result<ChampionNames> {
        let names = HashMap::from([
            (103, "Ahri".to_string()),
            (157, "Yasuo".to_string()),
            (64, "Lee Sin".to_string()),
        ]);
        Ok(Arc::new(names))
    }
}

/// A Discord REST call captured by `RecordingDiscordApi`
#[derive(Debug, Clone, PartialEq)]
pub enum DiscordCall {
    EditOriginal { token: String, payload: MessagePayload },
    Followup { token: String, payload: MessagePayload },
    EditMessage {
        channel_id: String,
        message_id: String,
        payload: MessagePayload,
    },
    InstallCommands { count: usize },
}

/// Discord REST fake that records every call
#[derive(Default)]
pub struct RecordingDiscordApi {
    calls: Mutex<Vec<DiscordCall>>,
}

impl RecordingDiscordApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DiscordCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until a recorded call matches, polling for up to two seconds
    pub async fn wait_for(&self, predicate: impl Fn(&DiscordCall) -> bool) -> DiscordCall {
        for _ in 0..200 {
            if let Some(call) = self.calls().into_iter().find(|call| predicate(call)) {
                return call;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected Discord call never happened: {:?}", self.calls());
    }
}

#[async_trait]
impl DiscordApi for RecordingDiscordApi {
    async fn edit_original_response(&self, token: &str, payload: MessagePayload) -> Result<()> {
        self.calls.lock().unwrap().push(DiscordCall::EditOriginal {
            token: token.to_string(),
            payload,
        });
        Ok(())
    }

    async fn create_followup(&self, token: &str, payload: MessagePayload) -> Result<()> {
        self.calls.lock().unwrap().push(DiscordCall::Followup {
            token: token.to_string(),
            payload,
        });
        Ok(())
    }

    async fn edit_channel_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: MessagePayload,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(DiscordCall::EditMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            payload,
        });
        Ok(())
    }

    async fn install_commands(&self, commands: Vec<CommandDefinition>) -> Result<usize> {
        let count = commands.len();
        self.calls
            .lock()
            .unwrap()
            .push(DiscordCall::InstallCommands { count });
        Ok(count)
    }
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&SIGNING_SEED)
}

/// Hex signature over `timestamp || body` with the test key
pub fn sign(timestamp: &str, body: &str) -> String {
    let mut message = timestamp.as_bytes().to_vec();
    message.extend_from_slice(body.as_bytes());
    hex::encode(signing_key().sign(&message).to_bytes())
}

/// Configuration for tests: in-memory profiles, no pacing, test public key
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.service.name = "riftbot-test".to_string();
    config.discord.application_id = "app".to_string();
    config.discord.public_key = hex::encode(signing_key().verifying_key().to_bytes());
    config.discord.verify_signatures = true;
    config.lobby.roster_pacing_ms = 0;
    config.profiles.storage = ProfileStorageKind::Memory;
    config
}

pub fn profile_storage_with(profiles: &[(&str, &RiotId)]) -> Arc<InMemoryProfileStorage> {
    let storage = Arc::new(InMemoryProfileStorage::new());
    for (discord_id, riot_id) in profiles {
        storage
            .store_profile(LeagueProfile::new(
                *discord_id,
                (*riot_id).clone(),
                PlatformRegion::Na1,
            ))
            .unwrap();
    }
    storage
}
