use anyhow::{bail, Result};
use cogni_core::ScoreReport;
use cogni_games::{Engine, Game};
use cogni_timing::{Clock, ManualClock, MonotonicClock};
use tracing::{debug, info};

use crate::player::Player;

/// Longest a single session may run on the host clock before giving up.
const SESSION_LIMIT_MS: u64 = 60 * 60 * 1_000;

/// Host time source: a virtual clock for fast simulation or the wall clock.
pub enum HostClock {
    Virtual(ManualClock),
    Realtime(MonotonicClock),
}

impl HostClock {
    pub fn new(realtime: bool) -> Self {
        if realtime {
            HostClock::Realtime(MonotonicClock::new())
        } else {
            HostClock::Virtual(ManualClock::starting_at(0))
        }
    }

    pub fn now(&self) -> u64 {
        match self {
            HostClock::Virtual(c) => c.now_ms(),
            HostClock::Realtime(c) => c.now_ms(),
        }
    }

    /// Moves to the next frame, sleeping on the wall clock when realtime.
    pub fn tick(&mut self, step_ms: u64) -> u64 {
        match self {
            HostClock::Virtual(c) => c.advance(step_ms),
            HostClock::Realtime(c) => {
                let target = c.now_ms() + step_ms;
                c.sleep_until(target);
                c.now_ms()
            }
        }
    }
}

/// Runs one engine to completion, feeding the player a snapshot every frame.
pub fn run<G, P>(
    game: G,
    player: &mut P,
    seed: u64,
    clock: &mut HostClock,
    step_ms: u64,
) -> Result<ScoreReport>
where
    G: Game,
    P: Player<G>,
{
    let started = clock.now();
    let mut engine = Engine::new(game, seed, started);
    if let Some(report) = engine.start(started) {
        return Ok(report);
    }
    let mut frames = 0u64;
    loop {
        let now = clock.tick(step_ms);
        frames += 1;
        if let Some(report) = engine.advance(now) {
            info!(domain = %G::DOMAIN, frames, host_ms = now - started, "session complete");
            return Ok(report);
        }
        let snapshot = engine.snapshot();
        for input in player.observe(&snapshot, now) {
            debug!(at = now, ?input, "player input");
            if let Some(report) = engine.input(now, input) {
                info!(domain = %G::DOMAIN, frames, host_ms = now - started, "session complete");
                return Ok(report);
            }
        }
        if now - started > SESSION_LIMIT_MS {
            engine.abandon();
            bail!(
                "{} session still running after {} ms",
                G::DOMAIN,
                SESSION_LIMIT_MS
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{DualTaskPlayer, RotationPlayer, SequencePlayer, VigilancePlayer};

    use cogni_games::{
        DualTaskConfig, DualTaskGame, RotationConfig, RotationGame, SequenceConfig, SequenceGame,
        VigilanceConfig, VigilanceGame,
    };

    fn play<G: Game, P: Player<G>>(game: G, mut player: P, seed: u64) -> ScoreReport {
        let mut clock = HostClock::new(false);
        run(game, &mut player, seed, &mut clock, 16).unwrap()
    }

    #[test]
    fn simulated_players_finish_every_game() {
        let sequence = SequenceGame::new(SequenceConfig::default());
        let vigilance = VigilanceGame::new(VigilanceConfig::default());
        let dual_task = DualTaskGame::new(DualTaskConfig::default());
        let rotation = RotationGame::new(RotationConfig::default());
        let reports = [
            play(sequence, SequencePlayer::new(0.9, 1), 1),
            play(vigilance, VigilancePlayer::new(0.9, 2), 2),
            play(dual_task, DualTaskPlayer::new(0.9, 3), 3),
            play(rotation, RotationPlayer::new(0.9, 4), 4),
        ];
        for report in &reports {
            assert!(report.score <= 100);
            assert!(report.trials > 0);
        }
        assert_eq!(reports[2].metric("tower_solved"), Some(1.0));
        assert_eq!(reports[3].trials, 20);
    }

    #[test]
    fn stronger_players_score_higher_on_vigilance() {
        let score = |skill| {
            let game = VigilanceGame::new(VigilanceConfig::default());
            play(game, VigilancePlayer::new(skill, 7), 7).score
        };
        assert!(score(1.0) > score(0.0));
    }
}
