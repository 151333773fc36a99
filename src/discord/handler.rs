//! Interaction dispatch
//!
//! Every interaction gets an immediate response. Commands that call the Riot
//! API answer with a deferred placeholder and finish in a background task that
//! edits it; lobby buttons reply ephemerally and refresh the lobby message or
//! post the balanced teams afterwards.

use crate::discord::api::DiscordApi;
use crate::discord::commands::{mastery_count, parse_custom_id, Command, LobbyAction};
use crate::discord::interaction::{Interaction, InteractionResponse, InteractionType, MessagePayload};
use crate::discord::render::{self, LiveGameView, ParticipantLine};
use crate::error::{is_riot_not_found, BotError};
use crate::lobby::{JoinOutcome, LeaveOutcome, LobbyBalancer, LobbyManager};
use crate::metrics::MetricsCollector;
use crate::profile::{LeagueProfile, ProfileStorage};
use crate::riot::{
    opgg_url, queue_description, Account, CurrentGameParticipant, PlatformRegion, RiotApi,
};
use crate::types::{LobbyId, RiotId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The immediate response plus the work still running for it
pub struct Dispatch {
    pub response: InteractionResponse,
    pub background: Option<JoinHandle<()>>,
}

impl Dispatch {
    fn immediate(response: InteractionResponse) -> Self {
        Self {
            response,
            background: None,
        }
    }
}

/// Collaborators the handler works with
#[derive(Clone)]
pub struct HandlerContext {
    pub riot: Arc<dyn RiotApi>,
    pub profiles: Arc<dyn ProfileStorage>,
    pub lobbies: Arc<LobbyManager>,
    pub balancer: Arc<LobbyBalancer>,
    pub discord: Arc<dyn DiscordApi>,
    pub metrics: Arc<MetricsCollector>,
    pub default_region: PlatformRegion,
}

/// Routes interactions to command and button handlers
#[derive(Clone)]
pub struct InteractionHandler {
    ctx: HandlerContext,
}

/// Outcome of a command: the reply and whether it counts as a success
struct CommandReply {
    payload: MessagePayload,
    success: bool,
}

impl CommandReply {
    fn ok(payload: MessagePayload) -> Self {
        Self {
            payload,
            success: true,
        }
    }

    fn text(content: impl Into<String>) -> Self {
        Self::ok(MessagePayload::text(content))
    }

    fn failed(content: impl Into<String>) -> Self {
        Self {
            payload: MessagePayload::text(content).ephemeral(),
            success: false,
        }
    }
}

impl InteractionHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }

    /// Handle one verified interaction
    pub async fn handle(&self, interaction: Interaction) -> Dispatch {
        self.ctx.metrics.record_interaction(&interaction.kind.to_string());

        match interaction.kind {
            InteractionType::Ping => Dispatch::immediate(InteractionResponse::pong()),
            InteractionType::ApplicationCommand => self.handle_command(interaction).await,
            InteractionType::MessageComponent => self.handle_component(interaction).await,
            other => {
                warn!("Ignoring unsupported interaction type {:?}", other);
                Dispatch::immediate(InteractionResponse::ephemeral(render::MSG_GENERIC_ERROR))
            }
        }
    }

    async fn handle_command(&self, interaction: Interaction) -> Dispatch {
        let command = match interaction.command_name().map(str::parse::<Command>) {
            Some(Ok(command)) => command,
            other => {
                warn!("Unknown command in interaction {}: {:?}", interaction.id, other);
                return Dispatch::immediate(InteractionResponse::ephemeral(
                    render::MSG_GENERIC_ERROR,
                ));
            }
        };

        info!(
            "Command /{} from {}",
            command,
            interaction.invoker_id().unwrap_or("unknown")
        );

        if !command.is_deferred() {
            let reply = self.run_command(command, &interaction).await;
            return Dispatch::immediate(InteractionResponse::message(reply));
        }

        let handler = self.clone();
        let background = tokio::spawn(async move {
            let payload = handler.run_command(command, &interaction).await;
            if let Err(e) = handler
                .ctx
                .discord
                .edit_original_response(&interaction.token, payload)
                .await
            {
                error!("Failed to complete /{} reply: {}", command, e);
            }
        });

        Dispatch {
            response: InteractionResponse::deferred(false),
            background: Some(background),
        }
    }

    /// Run a command to completion and return its reply
    pub async fn run_command(&self, command: Command, interaction: &Interaction) -> MessagePayload {
        let timer = self.ctx.metrics.start_timer();

        let reply = match command {
            Command::Ping => CommandReply::text(render::MSG_PONG),
            Command::RankedInfo => self.ranked_info(interaction).await,
            Command::SummonerInfo => self.summoner_info(interaction).await,
            Command::TopMastery => self.top_mastery(interaction).await,
            Command::LiveGame => self.live_game(interaction).await,
            Command::SetProfile => self.set_profile(interaction).await,
            Command::GetProfile => self.get_profile(interaction),
            Command::RankLeaderboard => self.rank_leaderboard(),
            Command::CreateLobby => self.create_lobby(interaction).await,
        };

        self.ctx
            .metrics
            .record_command(command.name(), reply.success, timer.stop());
        reply.payload
    }

    /// Riot ID and region from the `username`, `tagline` and `region` options
    fn explicit_target(
        &self,
        interaction: &Interaction,
    ) -> std::result::Result<Option<(RiotId, PlatformRegion)>, CommandReply> {
        let (Some(username), Some(tagline)) = (
            interaction.string_option("username"),
            interaction.string_option("tagline"),
        ) else {
            return Ok(None);
        };

        let region = match interaction.string_option("region") {
            Some(region) => PlatformRegion::normalize(&region)
                .map_err(|_| CommandReply::failed(render::invalid_region(&region)))?,
            None => self.ctx.default_region,
        };

        Ok(Some((RiotId::new(username, tagline), region)))
    }

    fn required_target(
        &self,
        interaction: &Interaction,
    ) -> std::result::Result<(RiotId, PlatformRegion), CommandReply> {
        self.explicit_target(interaction)?
            .ok_or_else(|| CommandReply::failed("Please provide a username, tagline and region."))
    }

    async fn account(
        &self,
        riot_id: &RiotId,
        region: PlatformRegion,
        error_message: &str,
    ) -> std::result::Result<Account, CommandReply> {
        self.ctx
            .riot
            .account_by_riot_id(region, riot_id)
            .await
            .map_err(|e| {
                if is_riot_not_found(&e) {
                    CommandReply::failed(render::player_not_found(riot_id, region))
                } else {
                    error!("Account lookup for {} failed: {}", riot_id, e);
                    CommandReply::failed(error_message)
                }
            })
    }

    async fn ranked_info(&self, interaction: &Interaction) -> CommandReply {
        let (riot_id, region) = match self.required_target(interaction) {
            Ok(target) => target,
            Err(reply) => return reply,
        };
        let account = match self.account(&riot_id, region, render::MSG_RANKED_ERROR).await {
            Ok(account) => account,
            Err(reply) => return reply,
        };

        let result = async {
            let summoner = self.ctx.riot.summoner_by_puuid(region, &account.puuid).await?;
            self.ctx.riot.ranked_queues(region, &summoner).await
        }
        .await;

        match result {
            Ok(queues) => CommandReply::text(render::ranked_info(&riot_id, &queues)),
            Err(e) => {
                error!("Error fetching summoner rank data for {}: {}", riot_id, e);
                CommandReply::failed(render::MSG_RANKED_ERROR)
            }
        }
    }

    async fn summoner_info(&self, interaction: &Interaction) -> CommandReply {
        let (riot_id, region) = match self.required_target(interaction) {
            Ok(target) => target,
            Err(reply) => return reply,
        };
        let account = match self.account(&riot_id, region, render::MSG_SUMMONER_ERROR).await {
            Ok(account) => account,
            Err(reply) => return reply,
        };

        match self.ctx.riot.summoner_by_puuid(region, &account.puuid).await {
            Ok(summoner) => CommandReply::text(render::summoner_info(&summoner)),
            Err(e) => {
                error!("Error fetching summoner data for {}: {}", riot_id, e);
                CommandReply::failed(render::MSG_SUMMONER_ERROR)
            }
        }
    }

    async fn top_mastery(&self, interaction: &Interaction) -> CommandReply {
        let (riot_id, region) = match self.required_target(interaction) {
            Ok(target) => target,
            Err(reply) => return reply,
        };
        let count = mastery_count(interaction.integer_option("count"));
        let account = match self.account(&riot_id, region, render::MSG_MASTERY_ERROR).await {
            Ok(account) => account,
            Err(reply) => return reply,
        };

        let masteries = match self
            .ctx
            .riot
            .top_champion_masteries(region, &account.puuid, count)
            .await
        {
            Ok(masteries) => masteries,
            Err(e) => {
                error!("Error fetching champion mastery for {}: {}", riot_id, e);
                return CommandReply::failed(render::MSG_MASTERY_ERROR);
            }
        };

        let names = match self.ctx.riot.champion_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Champion names unavailable, showing ids only: {}", e);
                Arc::default()
            }
        };

        CommandReply::text(render::top_mastery(&riot_id, &masteries, &names))
    }

    async fn live_game(&self, interaction: &Interaction) -> CommandReply {
        let target = match self.explicit_target(interaction) {
            Ok(target) => target,
            Err(reply) => return reply,
        };

        let (riot_id, region) = match target {
            Some(target) => target,
            None => {
                let saved = interaction
                    .invoker_id()
                    .and_then(|id| self.ctx.profiles.get_profile(id).ok().flatten());
                match saved {
                    Some(profile) => (profile.riot_id, profile.region),
                    None => return CommandReply::failed(render::MSG_LIVEGAME_NEEDS_DETAILS),
                }
            }
        };

        let account = match self.account(&riot_id, region, render::MSG_LIVEGAME_ERROR).await {
            Ok(account) => account,
            Err(reply) => return reply,
        };

        let game = match self.ctx.riot.active_game(region, &account.puuid).await {
            Ok(Some(game)) => game,
            Ok(None) => return CommandReply::failed(render::not_in_game(&riot_id)),
            Err(e) => {
                error!("Error fetching live game for {}: {}", riot_id, e);
                return CommandReply::failed(render::MSG_LIVEGAME_ERROR);
            }
        };

        let names = match self.ctx.riot.champion_names().await {
            Ok(names) => names,
            Err(e) => {
                error!("Error fetching champion data: {}", e);
                return CommandReply::failed(render::MSG_CHAMPIONS_ERROR);
            }
        };

        let (own_team, opposing_team) = game.split_teams(&account.puuid);
        let mut view = LiveGameView {
            player_name: riot_id.game_name.clone(),
            queue: queue_description(game.game_queue_config_id),
            game_length: game.game_length,
            own_team: Vec::with_capacity(own_team.len()),
            opposing_team: Vec::with_capacity(opposing_team.len()),
        };

        for participant in own_team {
            view.own_team
                .push(self.participant_line(region, participant, &names).await);
        }
        for participant in opposing_team {
            view.opposing_team
                .push(self.participant_line(region, participant, &names).await);
        }

        CommandReply::ok(MessagePayload::embed(render::live_game_embed(&view)))
    }

    /// Rank, champion and mastery of one live game participant; lookups that
    /// fail fall back to placeholders
    async fn participant_line(
        &self,
        region: PlatformRegion,
        participant: &CurrentGameParticipant,
        names: &std::collections::HashMap<i64, String>,
    ) -> ParticipantLine {
        let parsed_id = participant.riot_id.as_deref().and_then(RiotId::parse);

        let ranked = match (&participant.summoner_id, &participant.puuid) {
            (Some(summoner_id), _) => {
                self.ctx
                    .riot
                    .league_entries_by_summoner(region, summoner_id)
                    .await
            }
            (None, Some(puuid)) => self.ctx.riot.league_entries_by_puuid(region, puuid).await,
            (None, None) => Err(BotError::InternalError {
                message: "participant has no identifiers".to_string(),
            }
            .into()),
        };
        let solo_rank = match ranked {
            Ok(queues) => queues.solo_label(),
            Err(e) => {
                debug!("Rank lookup for participant failed: {}", e);
                "Unranked".to_string()
            }
        };

        let mastery_points = match &participant.puuid {
            Some(puuid) => match self.ctx.riot.champion_masteries(region, puuid).await {
                Ok(masteries) => masteries
                    .iter()
                    .find(|mastery| mastery.champion_id == participant.champion_id)
                    .map(|mastery| mastery.champion_points),
                Err(e) => {
                    debug!("Mastery lookup for participant failed: {}", e);
                    None
                }
            },
            None => None,
        };

        ParticipantLine {
            riot_id: participant
                .riot_id
                .clone()
                .unwrap_or_else(|| "Unknown Player".to_string()),
            opgg_url: parsed_id.map(|id| opgg_url(region, &id.game_name, &id.tag_line)),
            solo_rank,
            champion: names
                .get(&participant.champion_id)
                .cloned()
                .unwrap_or_else(|| "Unknown Champion".to_string()),
            mastery_points,
        }
    }

    async fn set_profile(&self, interaction: &Interaction) -> CommandReply {
        let Some(discord_id) = interaction.invoker_id() else {
            return CommandReply::failed(render::MSG_GENERIC_ERROR);
        };
        let (riot_id, region) = match self.required_target(interaction) {
            Ok(target) => target,
            Err(reply) => return reply,
        };

        let mut profile = LeagueProfile::new(discord_id, riot_id.clone(), region);

        match self.ctx.riot.account_by_riot_id(region, &riot_id).await {
            Ok(account) => {
                // Prefer Riot's spelling of the name
                if let (Some(game_name), Some(tag_line)) = (&account.game_name, &account.tag_line)
                {
                    profile.riot_id = RiotId::new(game_name, tag_line);
                }
                let rank = async {
                    let summoner = self.ctx.riot.summoner_by_puuid(region, &account.puuid).await?;
                    self.ctx.riot.ranked_queues(region, &summoner).await
                }
                .await;
                match rank {
                    Ok(queues) => profile.solo_rank = queues.solo_rank().rank_state(),
                    Err(e) => warn!("Could not look up rank for new profile {}: {}", riot_id, e),
                }
            }
            Err(e) if is_riot_not_found(&e) => {
                return CommandReply::failed(render::player_not_found(&riot_id, region));
            }
            Err(e) => warn!("Saving profile {} without verifying it: {}", riot_id, e),
        }

        let reply = render::profile_saved(&profile);
        match self.ctx.profiles.store_profile(profile) {
            Ok(()) => {
                info!("Saved profile for {}: {} ({})", discord_id, riot_id, region);
                CommandReply::text(reply)
            }
            Err(e) => {
                error!("Failed to save profile for {}: {}", discord_id, e);
                CommandReply::failed(render::MSG_GENERIC_ERROR)
            }
        }
    }

    fn get_profile(&self, interaction: &Interaction) -> CommandReply {
        let Some(discord_id) = interaction.invoker_id() else {
            return CommandReply::failed(render::MSG_GENERIC_ERROR);
        };

        match self.ctx.profiles.get_profile(discord_id) {
            Ok(profile) => CommandReply::text(render::profile_display(profile.as_ref())),
            Err(e) => {
                error!("Error reading profile for {}: {}", discord_id, e);
                CommandReply::failed(render::MSG_GENERIC_ERROR)
            }
        }
    }

    fn rank_leaderboard(&self) -> CommandReply {
        match self.ctx.profiles.leaderboard() {
            Ok(profiles) => match render::leaderboard(&profiles) {
                Some(embed) => CommandReply::ok(MessagePayload::embed(embed)),
                None => CommandReply::text(render::MSG_EMPTY_LEADERBOARD),
            },
            Err(e) => {
                error!("Error fetching rank leaderboard: {}", e);
                CommandReply::failed(render::MSG_LEADERBOARD_ERROR)
            }
        }
    }

    async fn create_lobby(&self, interaction: &Interaction) -> CommandReply {
        let Some(creator) = interaction.invoker_id() else {
            return CommandReply::failed(render::MSG_GENERIC_ERROR);
        };

        match self
            .ctx
            .lobbies
            .create_lobby(creator, interaction.integer_option("maxplayers"))
            .await
        {
            Ok(lobby) => CommandReply::ok(
                MessagePayload::embed(render::lobby_embed(&lobby))
                    .with_components(render::lobby_buttons(lobby.id())),
            ),
            Err(e) => {
                error!("Failed to create lobby for {}: {}", creator, e);
                CommandReply::failed(render::MSG_GENERIC_ERROR)
            }
        }
    }

    async fn handle_component(&self, interaction: Interaction) -> Dispatch {
        let parsed = interaction.custom_id().map(parse_custom_id);
        let (action, lobby_id) = match parsed {
            Some(Ok(parsed)) => parsed,
            _ => {
                warn!("Unrecognized component {:?}", interaction.custom_id());
                return Dispatch::immediate(InteractionResponse::ephemeral(render::MSG_LOBBY_GONE));
            }
        };
        let Some(user_id) = interaction.invoker_id().map(str::to_string) else {
            return Dispatch::immediate(InteractionResponse::ephemeral(render::MSG_GENERIC_ERROR));
        };

        match action {
            LobbyAction::Join => self.join(&interaction, lobby_id, &user_id).await,
            LobbyAction::Leave => self.leave(&interaction, lobby_id, &user_id).await,
            LobbyAction::Balance => self.balance(&interaction, lobby_id, &user_id).await,
        }
    }

    async fn join(&self, interaction: &Interaction, lobby_id: LobbyId, user_id: &str) -> Dispatch {
        match self.ctx.profiles.get_profile(user_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.ctx.metrics.record_player_action("join", false);
                return Dispatch::immediate(InteractionResponse::ephemeral(
                    render::MSG_JOIN_NEEDS_PROFILE,
                ));
            }
            Err(e) => {
                error!("Profile lookup for {} failed: {}", user_id, e);
                return Dispatch::immediate(InteractionResponse::ephemeral(
                    render::MSG_GENERIC_ERROR,
                ));
            }
        }

        match self.ctx.lobbies.join_lobby(lobby_id, user_id).await {
            Ok(JoinOutcome::Joined {
                player_count,
                max_players,
            }) => Dispatch {
                response: InteractionResponse::ephemeral(render::joined(player_count, max_players)),
                background: self.refresh_lobby_message(interaction, lobby_id),
            },
            Ok(JoinOutcome::AlreadyJoined) => {
                Dispatch::immediate(InteractionResponse::ephemeral(render::MSG_ALREADY_JOINED))
            }
            Err(e) => Dispatch::immediate(InteractionResponse::ephemeral(lobby_error_message(&e))),
        }
    }

    async fn leave(&self, interaction: &Interaction, lobby_id: LobbyId, user_id: &str) -> Dispatch {
        match self.ctx.lobbies.leave_lobby(lobby_id, user_id).await {
            Ok(LeaveOutcome::Left { .. }) => Dispatch {
                response: InteractionResponse::ephemeral(render::MSG_LEFT),
                background: self.refresh_lobby_message(interaction, lobby_id),
            },
            Ok(LeaveOutcome::NotInLobby) => {
                Dispatch::immediate(InteractionResponse::ephemeral(render::MSG_NOT_IN_LOBBY))
            }
            Err(e) => Dispatch::immediate(InteractionResponse::ephemeral(lobby_error_message(&e))),
        }
    }

    /// Re-render the lobby message the button belongs to
    fn refresh_lobby_message(
        &self,
        interaction: &Interaction,
        lobby_id: LobbyId,
    ) -> Option<JoinHandle<()>> {
        let message = interaction.message.clone()?;
        let handler = self.clone();

        Some(tokio::spawn(async move {
            let lobby = match handler.ctx.lobbies.get_lobby(lobby_id).await {
                Ok(Some(lobby)) => lobby,
                Ok(None) => return,
                Err(e) => {
                    error!("Failed to read lobby {}: {}", lobby_id, e);
                    return;
                }
            };

            let payload = MessagePayload::embed(render::lobby_embed(&lobby))
                .with_components(render::lobby_buttons(lobby_id));
            if let Err(e) = handler
                .ctx
                .discord
                .edit_channel_message(&message.channel_id, &message.id, payload)
                .await
            {
                error!("Failed to update lobby message {}: {}", message.id, e);
            }
        }))
    }

    async fn balance(&self, interaction: &Interaction, lobby_id: LobbyId, user_id: &str) -> Dispatch {
        let ticket = match self.ctx.lobbies.begin_balance(lobby_id, user_id).await {
            Ok(ticket) => ticket,
            Err(e) => {
                return Dispatch::immediate(InteractionResponse::ephemeral(lobby_error_message(&e)))
            }
        };

        let handler = self.clone();
        let token = interaction.token.clone();
        let background = tokio::spawn(async move {
            let result = handler.ctx.balancer.run(&ticket).await;
            let succeeded = result.is_ok();

            let payload = match result {
                Ok(teams) => MessagePayload::embed(render::balanced_teams_embed(&teams)),
                Err(e) => {
                    warn!("Balancing lobby {} failed: {}", ticket.lobby_id, e);
                    match e.downcast_ref::<BotError>() {
                        Some(BotError::PreconditionViolation { .. }) => {
                            MessagePayload::text(render::MSG_NOT_ENOUGH_VALID_PLAYERS).ephemeral()
                        }
                        _ => MessagePayload::text(render::MSG_BALANCE_ERROR).ephemeral(),
                    }
                }
            };

            if let Err(e) = handler.ctx.discord.create_followup(&token, payload).await {
                error!("Failed to post balanced teams for {}: {}", ticket.lobby_id, e);
            }
            if let Err(e) = handler
                .ctx
                .lobbies
                .finish_balance(ticket.lobby_id, succeeded)
                .await
            {
                error!("Failed to release lobby {}: {}", ticket.lobby_id, e);
            }
        });

        Dispatch {
            response: InteractionResponse::message(
                MessagePayload::embed(render::balancing_embed()).ephemeral(),
            ),
            background: Some(background),
        }
    }
}

/// Ephemeral reply for a failed lobby operation
fn lobby_error_message(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<BotError>() {
        Some(BotError::LobbyNotFound { .. }) => render::MSG_LOBBY_GONE,
        Some(BotError::LobbyFull { .. }) => render::MSG_LOBBY_FULL,
        Some(BotError::NotLobbyCreator { .. }) => render::MSG_ONLY_CREATOR,
        Some(BotError::PreconditionViolation { .. }) => render::MSG_NOT_ENOUGH_PLAYERS,
        Some(BotError::BalanceInProgress { .. }) => render::MSG_BALANCE_IN_PROGRESS,
        _ => {
            error!("Lobby operation failed: {}", error);
            render::MSG_GENERIC_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::BalanceStrategy;
    use crate::config::LobbySettings;
    use crate::discord::api::MockDiscordApi;
    use crate::discord::interaction::ResponseType;
    use crate::lobby::RosterBuilder;
    use crate::profile::InMemoryProfileStorage;
    use crate::riot::{ChampionMastery, ChampionNames, CurrentGame, RankedQueues, Summoner};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Riot stub with no accounts except "Known#NA1"
    struct StubRiot;

    #[async_trait]
    impl RiotApi for StubRiot {
        async fn account_by_riot_id(
            &self,
            _region: PlatformRegion,
            riot_id: &RiotId,
        ) -> crate::Result<Account> {
            if riot_id.game_name == "Known" {
                Ok(Account {
                    puuid: "p-known".to_string(),
                    game_name: Some("Known".to_string()),
                    tag_line: Some("NA1".to_string()),
                })
            } else {
                Err(BotError::RiotApi {
                    status: 404,
                    message: "Not Found".to_string(),
                }
                .into())
            }
        }

        async fn summoner_by_puuid(
            &self,
            _region: PlatformRegion,
            puuid: &str,
        ) -> crate::Result<Summoner> {
            Ok(Summoner {
                id: None,
                account_id: None,
                puuid: puuid.to_string(),
                profile_icon_id: 1,
                revision_date: 0,
                summoner_level: 30,
            })
        }

        async fn league_entries_by_summoner(
            &self,
            _region: PlatformRegion,
            _summoner_id: &str,
        ) -> crate::Result<RankedQueues> {
            Ok(RankedQueues::default())
        }

        async fn league_entries_by_puuid(
            &self,
            _region: PlatformRegion,
            _puuid: &str,
        ) -> crate::Result<RankedQueues> {
            Ok(RankedQueues::default())
        }

        async fn champion_masteries(
            &self,
            _region: PlatformRegion,
            _puuid: &str,
        ) -> crate::Result<Vec<ChampionMastery>> {
            Ok(Vec::new())
        }

        async fn top_champion_masteries(
            &self,
            _region: PlatformRegion,
            _puuid: &str,
            _count: u32,
        ) -> crate::Result<Vec<ChampionMastery>> {
            Ok(Vec::new())
        }

        async fn active_game(
            &self,
            _region: PlatformRegion,
            _puuid: &str,
        ) -> crate::Result<Option<CurrentGame>> {
            Ok(None)
        }

        async fn champion_names(&self) -> crate::Result<ChampionNames> {
            Ok(Arc::default())
        }
    }

    fn handler_with(discord: MockDiscordApi) -> (InteractionHandler, Arc<InMemoryProfileStorage>) {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let riot: Arc<dyn RiotApi> = Arc::new(StubRiot);
        let profiles = Arc::new(InMemoryProfileStorage::new());
        let balancer = LobbyBalancer::new(
            RosterBuilder::new(riot.clone(), profiles.clone(), Duration::ZERO),
            BalanceStrategy::Lookahead,
            metrics.clone(),
        );

        let ctx = HandlerContext {
            riot,
            profiles: profiles.clone(),
            lobbies: Arc::new(LobbyManager::new(LobbySettings::default(), metrics.clone())),
            balancer: Arc::new(balancer),
            discord: Arc::new(discord),
            metrics,
            default_region: PlatformRegion::Na1,
        };
        (InteractionHandler::new(ctx), profiles)
    }

    fn command(name: &str, options: serde_json::Value) -> Interaction {
        serde_json::from_value(json!({
            "id": "i1",
            "application_id": "app",
            "type": 2,
            "token": "tok",
            "data": {"name": name, "options": options},
            "member": {"user": {"id": "creator"}},
            "channel_id": "c1"
        }))
        .unwrap()
    }

    fn button(custom_id: &str, user: &str) -> Interaction {
        serde_json::from_value(json!({
            "id": "i2",
            "application_id": "app",
            "type": 3,
            "token": "tok2",
            "data": {"custom_id": custom_id, "component_type": 2},
            "member": {"user": {"id": user}},
            "channel_id": "c1",
            "message": {"id": "m1", "channel_id": "c1"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_ping_and_pong() {
        let (handler, _) = handler_with(MockDiscordApi::new());

        let ping: Interaction = serde_json::from_value(json!({
            "id": "1", "application_id": "app", "type": 1, "token": "t"
        }))
        .unwrap();
        let dispatch = handler.handle(ping).await;
        assert_eq!(dispatch.response.kind, ResponseType::Pong);

        let dispatch = handler.handle(command("ping", json!([]))).await;
        assert_eq!(dispatch.response.content(), Some("Pong!"));
        assert!(dispatch.background.is_none());
    }

    #[tokio::test]
    async fn test_deferred_command_edits_original() {
        let mut discord = MockDiscordApi::new();
        discord
            .expect_edit_original_response()
            .withf(|token, payload| {
                token == "tok"
                    && payload
                        .content
                        .as_deref()
                        .is_some_and(|c| c.starts_with("Could not find a player"))
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let (handler, _) = handler_with(discord);

        let dispatch = handler
            .handle(command(
                "rankedinfo",
                json!([
                    {"name": "username", "value": "Nobody"},
                    {"name": "tagline", "value": "NA1"},
                    {"name": "region", "value": "na"}
                ]),
            ))
            .await;

        assert_eq!(dispatch.response.kind, ResponseType::DeferredChannelMessage);
        dispatch.background.unwrap().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_region_reply() {
        let (handler, _) = handler_with(MockDiscordApi::new());
        let payload = handler
            .run_command(
                Command::SummonerInfo,
                &command(
                    "summonerinfo",
                    json!([
                        {"name": "username", "value": "Known"},
                        {"name": "tagline", "value": "NA1"},
                        {"name": "region", "value": "mars"}
                    ]),
                ),
            )
            .await;
        assert!(payload.content.unwrap().starts_with("Unknown region 'mars'"));
    }

    #[tokio::test]
    async fn test_set_and_get_profile() {
        let (handler, profiles) = handler_with(MockDiscordApi::new());

        let payload = handler
            .run_command(
                Command::SetProfile,
                &command(
                    "setprofile",
                    json!([
                        {"name": "username", "value": "Known"},
                        {"name": "tagline", "value": "na1"},
                        {"name": "region", "value": "NA"}
                    ]),
                ),
            )
            .await;
        assert_eq!(
            payload.content.as_deref(),
            Some("Your profile has been saved: **Known** NA1 (na1)")
        );
        assert!(profiles.get_profile("creator").unwrap().is_some());

        let dispatch = handler.handle(command("getprofile", json!([]))).await;
        assert_eq!(
            dispatch.response.content(),
            Some("Your saved profile: **Known** NA1 (na1)")
        );
    }

    #[tokio::test]
    async fn test_livegame_without_details_or_profile() {
        let (handler, _) = handler_with(MockDiscordApi::new());
        let payload = handler
            .run_command(Command::LiveGame, &command("livegame", json!([])))
            .await;
        assert_eq!(payload.content.as_deref(), Some(render::MSG_LIVEGAME_NEEDS_DETAILS));
    }

    #[tokio::test]
    async fn test_join_requires_profile_and_refreshes_message() {
        let mut discord = MockDiscordApi::new();
        discord
            .expect_edit_channel_message()
            .withf(|channel, message, _| channel == "c1" && message == "m1")
            .times(1)
            .returning(|_, _, _| Ok(()));
        let (handler, profiles) = handler_with(discord);

        let dispatch = handler
            .handle(command("createlobby", json!([{"name": "maxplayers", "value": 4}])))
            .await;
        let components = dispatch.response.data.unwrap().components.unwrap();
        let join_id = components[0].components[0].custom_id.clone();

        let dispatch = handler.handle(button(&join_id, "u1")).await;
        assert_eq!(dispatch.response.content(), Some(render::MSG_JOIN_NEEDS_PROFILE));
        assert!(dispatch.response.is_ephemeral());

        profiles
            .store_profile(LeagueProfile::new(
                "u1",
                RiotId::new("Known", "NA1"),
                PlatformRegion::Na1,
            ))
            .unwrap();
        let dispatch = handler.handle(button(&join_id, "u1")).await;
        assert_eq!(
            dispatch.response.content(),
            Some("You have joined the lobby. (1/4)")
        );
        dispatch.background.unwrap().await.unwrap();

        let dispatch = handler.handle(button(&join_id, "u1")).await;
        assert_eq!(dispatch.response.content(), Some(render::MSG_ALREADY_JOINED));
    }

    #[tokio::test]
    async fn test_balance_button_rules() {
        let (handler, _) = handler_with(MockDiscordApi::new());
        let dispatch = handler.handle(command("createlobby", json!([]))).await;
        let components = dispatch.response.data.unwrap().components.unwrap();
        let balance_id = components[0].components[2].custom_id.clone();

        let dispatch = handler.handle(button(&balance_id, "someone")).await;
        assert_eq!(dispatch.response.content(), Some(render::MSG_ONLY_CREATOR));

        let dispatch = handler.handle(button(&balance_id, "creator")).await;
        assert_eq!(dispatch.response.content(), Some(render::MSG_NOT_ENOUGH_PLAYERS));

        let gone = format!("balance:{}", crate::utils::generate_lobby_id());
        let dispatch = handler.handle(button(&gone, "creator")).await;
        assert_eq!(dispatch.response.content(), Some(render::MSG_LOBBY_GONE));
    }
}
