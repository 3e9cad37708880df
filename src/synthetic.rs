use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::pass_event::{PITCH_LENGTH, PITCH_WIDTH, PassEvent, PitchPoint, SeasonPasses};

const SQUAD_SIZE: usize = 11;

#[derive(Debug, Clone, Copy)]
pub struct SyntheticConfig {
    pub matches: usize,
    pub passes_per_match: usize,
    /// Chance that a possession step is a give-and-go rather than a single pass.
    pub one_two_rate: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            matches: 38,
            passes_per_match: 900,
            one_two_rate: 0.05,
            seed: 7,
        }
    }
}

/// Reproducible season of plausible completed passes, for benchmarks and load tests.
pub fn synthetic_season(cfg: SyntheticConfig) -> SeasonPasses {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut season = SeasonPasses::new();
    for idx in 0..cfg.matches {
        let match_id = 1_000 + idx as u64;
        season.insert(match_id, synthetic_match(&mut rng, match_id, &cfg));
    }
    season
}

fn synthetic_match(rng: &mut StdRng, match_id: u64, cfg: &SyntheticConfig) -> Vec<PassEvent> {
    let teams = [format!("Home {match_id}"), format!("Away {match_id}")];
    let mut out = Vec::with_capacity(cfg.passes_per_match);
    let mut clock = 0.0_f64;
    let mut side = 0usize;
    let mut holder = rng.gen_range(0..SQUAD_SIZE);
    let mut ball = PitchPoint::new(PITCH_LENGTH / 2.0, PITCH_WIDTH / 2.0);

    while out.len() < cfg.passes_per_match {
        clock += rng.gen_range(1.0..4.0);
        let receiver = teammate(rng, holder);
        let team = &teams[side];

        if rng.gen_bool(cfg.one_two_rate) && out.len() + 2 <= cfg.passes_per_match {
            let lay_off = advance(rng, ball, 6.0..12.0);
            let strike_from = jitter(rng, lay_off, 1.5);
            let finish = advance(rng, strike_from, 15.0..25.0);
            out.push(pass(match_id, clock, team, holder, receiver, ball, lay_off));
            clock += rng.gen_range(1.0..3.0);
            let mut back = pass(match_id, clock, team, receiver, holder, strike_from, finish);
            if rng.gen_bool(0.1) {
                back.shot_assist = Some(true);
            }
            out.push(back);
            ball = finish;
        } else {
            let end = advance(rng, ball, -10.0..18.0);
            out.push(pass(match_id, clock, team, holder, receiver, ball, end));
            ball = end;
            holder = receiver;
        }

        if rng.gen_bool(0.12) || ball.x >= PITCH_LENGTH - 2.0 {
            side = 1 - side;
            holder = rng.gen_range(0..SQUAD_SIZE);
            ball = PitchPoint::new(rng.gen_range(20.0..60.0), rng.gen_range(5.0..75.0));
        }
    }
    out
}

fn pass(
    match_id: u64,
    clock: f64,
    team: &str,
    from: usize,
    to: usize,
    start: PitchPoint,
    end: PitchPoint,
) -> PassEvent {
    // Provider clocks are whole seconds.
    let whole = clock.floor() as u32;
    PassEvent::new(
        match_id,
        whole / 60,
        whole % 60,
        team,
        &player_name(team, from),
        &player_name(team, to),
        start,
        end,
    )
}

fn player_name(team: &str, shirt: usize) -> String {
    format!("{team} #{}", shirt + 1)
}

fn teammate(rng: &mut StdRng, holder: usize) -> usize {
    let offset = rng.gen_range(1..SQUAD_SIZE);
    (holder + offset) % SQUAD_SIZE
}

fn advance(rng: &mut StdRng, from: PitchPoint, dx: std::ops::Range<f64>) -> PitchPoint {
    clamp(PitchPoint::new(
        from.x + rng.gen_range(dx),
        from.y + rng.gen_range(-12.0..12.0),
    ))
}

fn jitter(rng: &mut StdRng, at: PitchPoint, radius: f64) -> PitchPoint {
    clamp(PitchPoint::new(
        at.x + rng.gen_range(-radius..radius),
        at.y + rng.gen_range(-radius..radius),
    ))
}

fn clamp(p: PitchPoint) -> PitchPoint {
    PitchPoint::new(p.x.clamp(0.0, PITCH_LENGTH), p.y.clamp(0.0, PITCH_WIDTH))
}
