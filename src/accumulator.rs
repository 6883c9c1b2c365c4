#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Goal,
    Shot,
    Faceoff,
    Takeaway,
    Hit,
    Block,
    Giveaway,
}

impl Stat {
    pub const COUNT: usize = 7;

    pub const ALL: [Stat; Stat::COUNT] = [
        Stat::Goal,
        Stat::Shot,
        Stat::Faceoff,
        Stat::Takeaway,
        Stat::Hit,
        Stat::Block,
        Stat::Giveaway,
    ];

    pub fn index(self) -> usize {
        match self {
            Stat::Goal => 0,
            Stat::Shot => 1,
            Stat::Faceoff => 2,
            Stat::Takeaway => 3,
            Stat::Hit => 4,
            Stat::Block => 5,
            Stat::Giveaway => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stat::Goal => "goal",
            Stat::Shot => "shot",
            Stat::Faceoff => "faceoff",
            Stat::Takeaway => "takeaway",
            Stat::Hit => "hit",
            Stat::Block => "block",
            Stat::Giveaway => "giveaway",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Running {
    pub diff: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Default)]
pub struct StatAccumulator {
    running: [Running; Stat::COUNT],
    updates: [usize; Stat::COUNT],
}

impl StatAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, stat: Stat, home_delta: i64, away_delta: i64) -> Running {
        let slot = &mut self.running[stat.index()];
        slot.diff += home_delta - away_delta;
        slot.total += home_delta + away_delta;
        self.updates[stat.index()] += 1;
        *slot
    }

    pub fn get(&self, stat: Stat) -> Running {
        self.running[stat.index()]
    }

    pub fn updates(&self, stat: Stat) -> usize {
        self.updates[stat.index()]
    }

    pub fn snapshot(&self) -> [Running; Stat::COUNT] {
        self.running
    }
}

/// Sticky "who scored last" indicator: 1 home, -1 away, 0 nobody yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastGoal(i8);

impl LastGoal {
    pub fn observe(&mut self, home_goal: bool, away_goal: bool) -> i8 {
        if home_goal {
            self.0 = 1;
        } else if away_goal {
            self.0 = -1;
        }
        self.0
    }

    pub fn value(self) -> i8 {
        self.0
    }
}
