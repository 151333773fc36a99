//! Reply text and embeds for every command and lobby action

use crate::balance::ScoredPlayer;
use crate::discord::commands::LobbyAction;
use crate::discord::interaction::{
    truncate_field, ActionRow, Button, ButtonStyle, Embed, COLOR_BLUE, COLOR_GREEN, COLOR_YELLOW,
    EMBED_FIELD_LIMIT,
};
use crate::lobby::{BalancedTeams, CustomLobby, RosterEntry};
use crate::profile::LeagueProfile;
use crate::riot::{ChampionMastery, LeagueEntry, PlatformRegion, RankedQueues, Summoner};
use crate::types::{LobbyId, RiotId};
use crate::utils::{format_game_length, win_rate};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;

pub const MSG_PONG: &str = "Pong!";
pub const MSG_GENERIC_ERROR: &str = "There was an error while executing this command!";
pub const MSG_NO_PROFILE: &str =
    "No profile found. Use /setprofile to save your profile information.";
pub const MSG_JOIN_NEEDS_PROFILE: &str = "You do not have a linked Riot account. Please set up your profile with /setprofile before joining.";
pub const MSG_LIVEGAME_NEEDS_DETAILS: &str =
    "Please provide your Riot ID details or set up your profile with /setprofile.";
pub const MSG_LOBBY_GONE: &str = "This lobby no longer exists.";
pub const MSG_LOBBY_FULL: &str = "Lobby is full.";
pub const MSG_ALREADY_JOINED: &str = "You are already in the lobby.";
pub const MSG_LEFT: &str = "You have left the lobby.";
pub const MSG_NOT_IN_LOBBY: &str = "You are not in this lobby.";
pub const MSG_ONLY_CREATOR: &str = "Only the lobby creator can balance teams.";
pub const MSG_NOT_ENOUGH_PLAYERS: &str = "Not enough players to balance teams.";
pub const MSG_NOT_ENOUGH_VALID_PLAYERS: &str = "Not enough valid players to balance teams.";
pub const MSG_BALANCE_IN_PROGRESS: &str = "Teams are already being balanced for this lobby.";
pub const MSG_BALANCE_ERROR: &str = "There was an error balancing the teams.";
pub const MSG_EMPTY_LEADERBOARD: &str = "No users found in the leaderboard.";
pub const MSG_RANKED_ERROR: &str = "There was an error fetching the ranked data. Please try again later.";
pub const MSG_SUMMONER_ERROR: &str =
    "There was an error fetching the account information. Please try again later.";
pub const MSG_MASTERY_ERROR: &str =
    "There was an error fetching the champion mastery data. Please try again later.";
pub const MSG_LIVEGAME_ERROR: &str =
    "There was an error fetching the live game data. Please try again later.";
pub const MSG_CHAMPIONS_ERROR: &str = "Failed to fetch champion data. Please try again later.";
pub const MSG_LEADERBOARD_ERROR: &str =
    "There was an error fetching the rank leaderboard. Please try again later.";

pub fn joined(player_count: usize, max_players: usize) -> String {
    format!("You have joined the lobby. ({}/{})", player_count, max_players)
}

pub fn invalid_region(region: &str) -> String {
    format!(
        "Unknown region '{}'. Use one of: na, euw, eune, br, jp, kr, oc, ru, tr, la (or a platform id such as na1).",
        region
    )
}

/// Reply for a Riot ID that resolves to no account
pub fn player_not_found(riot_id: &RiotId, region: PlatformRegion) -> String {
    format!(
        "Could not find a player with the username: {} and tagline: {} in the {} region. Please make sure the details are correct.",
        riot_id.game_name,
        riot_id.tag_line,
        region.as_str().to_uppercase()
    )
}

pub fn not_in_game(riot_id: &RiotId) -> String {
    format!(
        "No live game data found for the player: {}. They might not be in a game currently.",
        riot_id.game_name
    )
}

fn queue_block(label: &str, entry: Option<&LeagueEntry>) -> String {
    match entry {
        Some(entry) => format!(
            "**{}:**\nTier: {} {} ({} LP)\n{} Games, {}% Winrate\nWins: {}, Losses: {}",
            label,
            entry.tier,
            entry.rank,
            entry.league_points,
            entry.games_played(),
            win_rate(entry.wins, entry.losses).unwrap_or_else(|| "0.00".to_string()),
            entry.wins,
            entry.losses
        ),
        None => format!("**{}:** Not available", label),
    }
}

/// `/rankedinfo` reply
pub fn ranked_info(riot_id: &RiotId, queues: &RankedQueues) -> String {
    format!(
        "Ranked Data for Summoner: {} {}\n\n{}\n\n{}",
        riot_id.game_name,
        riot_id.tag_line,
        queue_block("Solo/Duo Queue", queues.solo.as_ref()),
        queue_block("Flex Queue", queues.flex.as_ref())
    )
}

/// `/summonerinfo` reply
pub fn summoner_info(summoner: &Summoner) -> String {
    let revision_date = Utc
        .timestamp_millis_opt(summoner.revision_date)
        .single()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| summoner.revision_date.to_string());

    format!(
        "**Summoner ID:** {}\n**Account ID:** {}\n**PUUID:** {}\n**Profile Icon ID:** {}\n**Revision Date:** {}\n**Summoner Level:** {}",
        summoner.id.as_deref().unwrap_or("N/A"),
        summoner.account_id.as_deref().unwrap_or("N/A"),
        summoner.puuid,
        summoner.profile_icon_id,
        revision_date,
        summoner.summoner_level
    )
}

fn champion_name(names: &HashMap<i64, String>, champion_id: i64) -> String {
    names
        .get(&champion_id)
        .cloned()
        .unwrap_or_else(|| "Unknown Champion".to_string())
}

/// `/topmastery` reply
pub fn top_mastery(
    riot_id: &RiotId,
    masteries: &[ChampionMastery],
    names: &HashMap<i64, String>,
) -> String {
    let mut message = format!(
        "Champion Mastery Data for Summoner: {} {}\n\n",
        riot_id.game_name, riot_id.tag_line
    );

    if masteries.is_empty() {
        message.push_str("No champion mastery data found.");
        return message;
    }

    let lines: Vec<String> = masteries
        .iter()
        .enumerate()
        .map(|(index, mastery)| {
            format!(
                "**{}. {}**: {} points (Level {})",
                index + 1,
                champion_name(names, mastery.champion_id),
                mastery.champion_points,
                mastery.champion_level
            )
        })
        .collect();
    message.push_str(&lines.join("\n"));
    message
}

pub fn profile_saved(profile: &LeagueProfile) -> String {
    format!(
        "Your profile has been saved: **{}** {} ({})",
        profile.riot_id.game_name, profile.riot_id.tag_line, profile.region
    )
}

pub fn profile_display(profile: Option<&LeagueProfile>) -> String {
    match profile {
        Some(profile) => format!(
            "Your saved profile: **{}** {} ({})",
            profile.riot_id.game_name, profile.riot_id.tag_line, profile.region
        ),
        None => MSG_NO_PROFILE.to_string(),
    }
}

/// `/rankleaderboard` embed, `None` when there is nobody to show
pub fn leaderboard(profiles: &[LeagueProfile]) -> Option<Embed> {
    if profiles.is_empty() {
        return None;
    }

    let mut embed = Embed::new("Solo/Duo Rank Leaderboard")
        .description("Here is the rank leaderboard based on Solo/Duo ranks.")
        .color(COLOR_BLUE)
        .timestamp(Utc::now());

    // Entries are packed into as few fields as the value limit allows
    let mut chunk = String::new();
    for (index, profile) in profiles.iter().enumerate() {
        let rank = profile
            .solo_rank
            .as_ref()
            .map(|rank| rank.to_string())
            .unwrap_or_else(|| "Unranked".to_string());
        let entry = format!(
            "**#{}: <@{}>**\nRiot ID: {}\nRank: {}\n\n",
            index + 1,
            profile.discord_id,
            profile.riot_id,
            rank
        );

        if chunk.len() + entry.len() > EMBED_FIELD_LIMIT {
            embed = embed.field("Leaderboard", chunk.trim_end(), false);
            chunk = String::new();
        }
        chunk.push_str(&entry);
    }
    if !chunk.is_empty() {
        embed = embed.field("Leaderboard", chunk.trim_end(), false);
    }

    Some(embed)
}

fn mention_list(players: &[String]) -> String {
    if players.is_empty() {
        return "No players yet.".to_string();
    }
    truncate_field(
        &players
            .iter()
            .map(|id| format!("<@{}>", id))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// The lobby message, re-rendered after every join or leave
pub fn lobby_embed(lobby: &CustomLobby) -> Embed {
    Embed::new("Custom Lobby Created")
        .description(format!(
            "Lobby created by <@{}>. Max Players: {}",
            lobby.creator(),
            lobby.max_players()
        ))
        .color(COLOR_BLUE)
        .field(
            format!("Current Players ({}/{})", lobby.player_count(), lobby.max_players()),
            mention_list(lobby.players()),
            false,
        )
}

/// Join / Leave / Balance buttons of a lobby
pub fn lobby_buttons(lobby_id: LobbyId) -> Vec<ActionRow> {
    vec![ActionRow::new(vec![
        Button::new(
            ButtonStyle::Primary,
            "Join Lobby",
            LobbyAction::Join.custom_id(lobby_id),
        ),
        Button::new(
            ButtonStyle::Danger,
            "Leave Lobby",
            LobbyAction::Leave.custom_id(lobby_id),
        ),
        Button::new(
            ButtonStyle::Success,
            "Balance Teams",
            LobbyAction::Balance.custom_id(lobby_id),
        ),
    ])]
}

pub fn balancing_embed() -> Embed {
    Embed::new("Balancing Teams")
        .description("Please wait while we balance the teams...")
        .color(COLOR_YELLOW)
}

fn team_lines(team: &[ScoredPlayer<RosterEntry>]) -> String {
    truncate_field(
        &team
            .iter()
            .map(|player| format!("<@{}> ({})", player.player.discord_id, player.player.rank_label()))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// The public result of a balancing run
pub fn balanced_teams_embed(teams: &BalancedTeams) -> Embed {
    let assignment = &teams.assignment;
    let mut notes = vec![format!(
        "Team 1 skill: {:.0} | Team 2 skill: {:.0} | Difference: {:.0}",
        assignment.team1_skill(),
        assignment.team2_skill(),
        assignment.difference()
    )];

    if !teams.skipped.is_empty() {
        notes.push(format!(
            "Skipped (rank lookup failed): {} player(s)",
            teams.skipped.len()
        ));
    }

    for (discord_id, warning) in &teams.warnings {
        notes.push(format!("Rank data for {}: {}", discord_id, warning));
    }

    let mut embed = Embed::new("Teams Balanced")
        .description("Teams have been balanced based on ranks and total games played for unranked players.")
        .color(COLOR_GREEN)
        .field("Team 1", team_lines(&assignment.team1), true)
        .field("Team 2", team_lines(&assignment.team2), true)
        .footer(notes.join("\n"));

    if !teams.skipped.is_empty() {
        embed = embed.field(
            "Skipped Players",
            mention_list(
                &teams
                    .skipped
                    .iter()
                    .map(|player| player.discord_id.clone())
                    .collect::<Vec<_>>(),
            ),
            false,
        );
    }

    embed
}

/// One participant line of the live game embed
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantLine {
    pub riot_id: String,
    pub opgg_url: Option<String>,
    pub solo_rank: String,
    pub champion: String,
    pub mastery_points: Option<i64>,
}

/// Everything the live game embed shows
#[derive(Debug, Clone, PartialEq)]
pub struct LiveGameView {
    pub player_name: String,
    pub queue: &'static str,
    pub game_length: i64,
    pub own_team: Vec<ParticipantLine>,
    pub opposing_team: Vec<ParticipantLine>,
}

fn participant_block(lines: &[ParticipantLine]) -> String {
    if lines.is_empty() {
        return "No players".to_string();
    }
    let blocks: Vec<String> = lines
        .iter()
        .map(|line| {
            let name = match &line.opgg_url {
                Some(url) => format!("**[{}]({})**", line.riot_id, url),
                None => format!("**{}**", line.riot_id),
            };
            format!(
                "{}\nSolo/Duo Rank: {}\nChampion: {}\nMastery Points: {}",
                name,
                line.solo_rank,
                line.champion,
                line.mastery_points
                    .map(|points| points.to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            )
        })
        .collect();
    truncate_field(&blocks.join("\n\n"))
}

/// `/livegame` embed
pub fn live_game_embed(view: &LiveGameView) -> Embed {
    Embed::new(format!("Live Game Data for {}", view.player_name))
        .description(format!(
            "Queue Type: {}\nGame Length: {}",
            view.queue,
            format_game_length(view.game_length)
        ))
        .color(COLOR_BLUE)
        .timestamp(Utc::now())
        .field("Your Team", participant_block(&view.own_team), true)
        .field("Opposing Team", participant_block(&view.opposing_team), true)
}
