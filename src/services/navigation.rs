use tokio::sync::mpsc;
use tracing::warn;

use crate::state::GameSessionHandoff;

/// Receives the session when the lobby hands over to the game screen.
pub trait Navigator {
    /// Open the game screen for `handoff`.
    fn navigate(&mut self, handoff: GameSessionHandoff);
}

/// Hands the session to whichever task owns the game screen.
impl Navigator for mpsc::UnboundedSender<GameSessionHandoff> {
    fn navigate(&mut self, handoff: GameSessionHandoff) {
        let game_id = handoff.game_id.clone();
        if self.send(handoff).is_err() {
            warn!(%game_id, "game screen is gone; handoff dropped");
        }
    }
}

/// Collects handoffs in order.
impl Navigator for Vec<GameSessionHandoff> {
    fn navigate(&mut self, handoff: GameSessionHandoff) {
        self.push(handoff);
    }
}
