use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::accumulator::Stat;

pub const REGULATION_SECONDS: i32 = 3600;

/// Goalie number used by the detailed log when no goalie is on the ice or the
/// roster cell was blank.
pub const UNKNOWN_GOALIE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Home, Side::Away];

    pub fn index(self) -> usize {
        match self {
            Side::Home => 0,
            Side::Away => 1,
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            Side::Home => 1,
            Side::Away => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => f.write_str("home"),
            Side::Away => f.write_str("away"),
        }
    }
}

/// Event kinds kept by the live feed. Anything else the feed emits is carried
/// as `Other` so the engine can reject it loudly instead of at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LiveEventKind {
    GameOfficial,
    GameEnd,
    BlockedShot,
    Faceoff,
    Takeaway,
    Hit,
    Shot,
    MissedShot,
    Penalty,
    Giveaway,
    Goal,
    Other(String),
}

impl LiveEventKind {
    pub const KNOWN: [LiveEventKind; 11] = [
        LiveEventKind::GameOfficial,
        LiveEventKind::GameEnd,
        LiveEventKind::BlockedShot,
        LiveEventKind::Faceoff,
        LiveEventKind::Takeaway,
        LiveEventKind::Hit,
        LiveEventKind::Shot,
        LiveEventKind::MissedShot,
        LiveEventKind::Penalty,
        LiveEventKind::Giveaway,
        LiveEventKind::Goal,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            LiveEventKind::GameOfficial => "Game Official",
            LiveEventKind::GameEnd => "Game End",
            LiveEventKind::BlockedShot => "Blocked Shot",
            LiveEventKind::Faceoff => "Faceoff",
            LiveEventKind::Takeaway => "Takeaway",
            LiveEventKind::Hit => "Hit",
            LiveEventKind::Shot => "Shot",
            LiveEventKind::MissedShot => "Missed Shot",
            LiveEventKind::Penalty => "Penalty",
            LiveEventKind::Giveaway => "Giveaway",
            LiveEventKind::Goal => "Goal",
            LiveEventKind::Other(raw) => raw,
        }
    }

    pub fn detailed_code(&self) -> Option<DetailedEventCode> {
        let code = match self {
            LiveEventKind::GameOfficial | LiveEventKind::GameEnd => DetailedEventCode::GameEnd,
            LiveEventKind::BlockedShot => DetailedEventCode::Block,
            LiveEventKind::Faceoff => DetailedEventCode::Faceoff,
            LiveEventKind::Takeaway => DetailedEventCode::Takeaway,
            LiveEventKind::Hit => DetailedEventCode::Hit,
            LiveEventKind::Shot => DetailedEventCode::Shot,
            LiveEventKind::MissedShot => DetailedEventCode::Miss,
            LiveEventKind::Penalty => DetailedEventCode::Penalty,
            LiveEventKind::Giveaway => DetailedEventCode::Giveaway,
            LiveEventKind::Goal => DetailedEventCode::Goal,
            LiveEventKind::Other(_) => return None,
        };
        Some(code)
    }
}

impl From<String> for LiveEventKind {
    fn from(raw: String) -> Self {
        LiveEventKind::KNOWN
            .into_iter()
            .find(|kind| kind.as_str() == raw.trim())
            .unwrap_or(LiveEventKind::Other(raw))
    }
}

impl From<LiveEventKind> for String {
    fn from(kind: LiveEventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for LiveEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DetailedEventCode {
    Faceoff,
    Hit,
    Giveaway,
    Takeaway,
    Shot,
    Miss,
    Block,
    Goal,
    Penalty,
    DelayedPenalty,
    Stoppage,
    PeriodStart,
    PeriodEnd,
    GameEnd,
    Other(String),
}

impl DetailedEventCode {
    const KNOWN: [DetailedEventCode; 14] = [
        DetailedEventCode::Faceoff,
        DetailedEventCode::Hit,
        DetailedEventCode::Giveaway,
        DetailedEventCode::Takeaway,
        DetailedEventCode::Shot,
        DetailedEventCode::Miss,
        DetailedEventCode::Block,
        DetailedEventCode::Goal,
        DetailedEventCode::Penalty,
        DetailedEventCode::DelayedPenalty,
        DetailedEventCode::Stoppage,
        DetailedEventCode::PeriodStart,
        DetailedEventCode::PeriodEnd,
        DetailedEventCode::GameEnd,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            DetailedEventCode::Faceoff => "FAC",
            DetailedEventCode::Hit => "HIT",
            DetailedEventCode::Giveaway => "GIVE",
            DetailedEventCode::Takeaway => "TAKE",
            DetailedEventCode::Shot => "SHOT",
            DetailedEventCode::Miss => "MISS",
            DetailedEventCode::Block => "BLOCK",
            DetailedEventCode::Goal => "GOAL",
            DetailedEventCode::Penalty => "PENL",
            DetailedEventCode::DelayedPenalty => "DELPEN",
            DetailedEventCode::Stoppage => "STOP",
            DetailedEventCode::PeriodStart => "PSTR",
            DetailedEventCode::PeriodEnd => "PEND",
            DetailedEventCode::GameEnd => "GEND",
            DetailedEventCode::Other(raw) => raw,
        }
    }
}

impl From<String> for DetailedEventCode {
    fn from(raw: String) -> Self {
        DetailedEventCode::KNOWN
            .into_iter()
            .find(|code| code.as_str() == raw.trim())
            .unwrap_or(DetailedEventCode::Other(raw))
    }
}

impl From<DetailedEventCode> for String {
    fn from(code: DetailedEventCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for DetailedEventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skaters and goalie on the ice for one side, stored by the report as
/// `"{forwards}_{defense}_{goalies}"`, or `"-1"` when the cell was blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OnIceRepr", into = "String")]
pub enum OnIce {
    Known {
        forwards: u8,
        defense: u8,
        goalies: u8,
    },
    Unknown,
}

impl OnIce {
    pub fn count(self) -> i32 {
        match self {
            OnIce::Known {
                forwards,
                defense,
                goalies,
            } => i32::from(forwards) + i32::from(defense) + i32::from(goalies),
            OnIce::Unknown => -1,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OnIceRepr {
    Text(String),
    Number(i64),
}

impl TryFrom<OnIceRepr> for OnIce {
    type Error = String;

    fn try_from(repr: OnIceRepr) -> Result<Self, Self::Error> {
        let raw = match repr {
            OnIceRepr::Number(-1) => return Ok(OnIce::Unknown),
            OnIceRepr::Number(n) => return Err(format!("invalid on-ice count {n}")),
            OnIceRepr::Text(raw) => raw,
        };
        let raw = raw.trim();
        if raw == "-1" {
            return Ok(OnIce::Unknown);
        }
        let parts = raw
            .split('_')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| format!("invalid on-ice cell `{raw}`: {err}"))?;
        match parts.as_slice() {
            [forwards, defense, goalies] => Ok(OnIce::Known {
                forwards: *forwards,
                defense: *defense,
                goalies: *goalies,
            }),
            _ => Err(format!("on-ice cell `{raw}` is not F_D_G")),
        }
    }
}

impl From<OnIce> for String {
    fn from(on_ice: OnIce) -> Self {
        match on_ice {
            OnIce::Known {
                forwards,
                defense,
                goalies,
            } => format!("{forwards}_{defense}_{goalies}"),
            OnIce::Unknown => "-1".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
}

/// Accepts `true`/`false` or the fetch layer's integer flags (1 = set; 0 and
/// the -1 "no data" sentinel are both unset).
fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FlagRepr::deserialize(deserializer)? {
        FlagRepr::Bool(value) => value,
        FlagRepr::Int(value) => value == 1,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLiveEvent {
    #[serde(rename = "gameId")]
    pub game_id: u64,
    #[serde(rename = "playId")]
    pub play_id: u32,
    pub event: LiveEventKind,
    #[serde(rename = "timestamp")]
    pub time_remaining: i32,
    #[serde(default)]
    pub home_faceoff_won: u8,
    #[serde(default)]
    pub away_faceoff_won: u8,
    #[serde(default)]
    pub home_hit: u8,
    #[serde(default)]
    pub away_hit: u8,
    #[serde(default)]
    pub home_goal: u8,
    #[serde(default)]
    pub away_goal: u8,
    #[serde(default)]
    pub home_giveaway: u8,
    #[serde(default)]
    pub away_giveaway: u8,
    #[serde(default)]
    pub home_takeaway: u8,
    #[serde(default)]
    pub away_takeaway: u8,
    #[serde(default)]
    pub home_block: u8,
    #[serde(default)]
    pub away_block: u8,
    #[serde(default)]
    pub home_shot: u8,
    #[serde(default)]
    pub away_shot: u8,
    #[serde(default)]
    pub home_penalty: u8,
    #[serde(default)]
    pub away_penalty: u8,
    #[serde(default)]
    pub shot_x: Option<f64>,
    #[serde(default)]
    pub shot_y: Option<f64>,
    #[serde(default, deserialize_with = "de_flag")]
    pub home_win: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub away_win: bool,
}

impl RawLiveEvent {
    pub fn new(game_id: u64, play_id: u32, event: LiveEventKind, time_remaining: i32) -> Self {
        Self {
            game_id,
            play_id,
            event,
            time_remaining,
            home_faceoff_won: 0,
            away_faceoff_won: 0,
            home_hit: 0,
            away_hit: 0,
            home_goal: 0,
            away_goal: 0,
            home_giveaway: 0,
            away_giveaway: 0,
            home_takeaway: 0,
            away_takeaway: 0,
            home_block: 0,
            away_block: 0,
            home_shot: 0,
            away_shot: 0,
            home_penalty: 0,
            away_penalty: 0,
            shot_x: None,
            shot_y: None,
            home_win: false,
            away_win: false,
        }
    }

    pub fn stat_delta(&self, stat: Stat, side: Side) -> i64 {
        let (home, away) = match stat {
            Stat::Goal => (self.home_goal, self.away_goal),
            Stat::Shot => (self.home_shot, self.away_shot),
            Stat::Faceoff => (self.home_faceoff_won, self.away_faceoff_won),
            Stat::Takeaway => (self.home_takeaway, self.away_takeaway),
            Stat::Hit => (self.home_hit, self.away_hit),
            Stat::Block => (self.home_block, self.away_block),
            Stat::Giveaway => (self.home_giveaway, self.away_giveaway),
        };
        match side {
            Side::Home => i64::from(home),
            Side::Away => i64::from(away),
        }
    }

    pub fn winner(&self) -> Option<Side> {
        if self.home_win {
            Some(Side::Home)
        } else if self.away_win {
            Some(Side::Away)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedLogRow {
    #[serde(rename = "timestamp")]
    pub time_remaining: i32,
    pub event: DetailedEventCode,
    pub home_on_ice: OnIce,
    pub away_on_ice: OnIce,
    #[serde(default = "unknown_goalie")]
    pub home_goalie_number: i32,
    #[serde(default = "unknown_goalie")]
    pub away_goalie_number: i32,
    #[serde(default, deserialize_with = "de_flag")]
    pub home_pulled_goalie: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub away_pulled_goalie: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub home_penalty: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub away_penalty: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub home_del_penalty: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub away_del_penalty: bool,
}

fn unknown_goalie() -> i32 {
    UNKNOWN_GOALIE
}

impl DetailedLogRow {
    pub fn new(time_remaining: i32, event: DetailedEventCode) -> Self {
        let full = OnIce::Known {
            forwards: 3,
            defense: 2,
            goalies: 1,
        };
        Self {
            time_remaining,
            event,
            home_on_ice: full,
            away_on_ice: full,
            home_goalie_number: UNKNOWN_GOALIE,
            away_goalie_number: UNKNOWN_GOALIE,
            home_pulled_goalie: false,
            away_pulled_goalie: false,
            home_penalty: false,
            away_penalty: false,
            home_del_penalty: false,
            away_del_penalty: false,
        }
    }

    pub fn on_ice(&self, side: Side) -> OnIce {
        match side {
            Side::Home => self.home_on_ice,
            Side::Away => self.away_on_ice,
        }
    }

    pub fn goalie_number(&self, side: Side) -> i32 {
        match side {
            Side::Home => self.home_goalie_number,
            Side::Away => self.away_goalie_number,
        }
    }

    pub fn pulled_goalie(&self, side: Side) -> bool {
        match side {
            Side::Home => self.home_pulled_goalie,
            Side::Away => self.away_pulled_goalie,
        }
    }
}

/// One shift of one player. Times are seconds remaining, so `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftInterval {
    #[serde(rename = "playerId")]
    pub player_id: u64,
    #[serde(rename = "start_shift")]
    pub start: i32,
    #[serde(rename = "end_shift")]
    pub end: i32,
    #[serde(rename = "shift_length")]
    pub length: i32,
}

impl ShiftInterval {
    pub fn new(player_id: u64, start: i32, end: i32) -> Self {
        Self {
            player_id,
            start,
            end,
            length: start - end,
        }
    }

    pub fn corrupted(player_id: u64) -> Self {
        Self {
            player_id,
            start: 0,
            end: 0,
            length: 0,
        }
    }

    pub fn is_corrupted(&self) -> bool {
        self.start == 0 && self.end == 0 && self.length == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameTables {
    pub game_id: u64,
    pub live: Vec<RawLiveEvent>,
    pub detailed: Vec<DetailedLogRow>,
    pub home_shifts: Vec<ShiftInterval>,
    pub away_shifts: Vec<ShiftInterval>,
}

impl GameTables {
    pub fn shifts(&self, side: Side) -> &[ShiftInterval] {
        match side {
            Side::Home => &self.home_shifts,
            Side::Away => &self.away_shifts,
        }
    }
}
