/// Matchmaking and private room controller.
pub mod lobby;
/// Handoff of game sessions to the game screen.
pub mod navigation;
/// Private room identifier generation.
pub mod room_code;
/// Async event loop driving the controller.
pub mod runner;
/// Subscription feature gate.
pub mod subscription;
