//! Integration tests for full games played through the public API.
//!
//! Covers turn order, win detection in every direction, rejected moves,
//! gravity inversion and reset.

use power4::{
    Cell, GameConfig, GameRegistry, GameState, Gravity, MoveError, MoveResult, Phase, Player,
};

fn play_all(game: &mut GameState, columns: &[i64]) -> MoveResult {
    let mut last = MoveResult::Continued;
    for &col in columns {
        last = game
            .play(col)
            .unwrap_or_else(|err| panic!("move in column {col} rejected: {err}"))
            .result;
    }
    last
}

#[test]
fn test_first_token_lands_bottom() {
    let mut game = GameState::new();
    let outcome = game.play(3).unwrap();

    assert_eq!(outcome.row, 5);
    assert_eq!(outcome.player, Player::PlayerOne);
    assert_eq!(game.board().get(5, 3), Some(Cell::PlayerOne));
    assert_eq!(game.current_player(), Player::PlayerTwo);
    assert_eq!(game.move_count(), 1);
}

#[test]
fn test_vertical_win_classic() {
    let mut game = GameState::with_config(GameConfig::classic()).unwrap();
    let result = play_all(&mut game, &[0, 1, 0, 1, 0, 1, 0]);

    assert_eq!(result, MoveResult::Won(Player::PlayerOne));
    assert!(game.is_finished());
    assert_eq!(game.winner(), Some(Player::PlayerOne));
    assert_eq!(game.message(), "Player 1 wins!");
    for row in 2..6 {
        assert_eq!(game.board().get(row, 0), Some(Cell::PlayerOne));
    }
    assert_eq!(game.phase(), Phase::Won(Player::PlayerOne));
}

#[test]
fn test_line_joins_tokens_from_both_gravities() {
    let config = GameConfig {
        rows: 3,
        cols: 3,
        connect: 3,
        gravity_flip_period: Some(2),
    };
    let mut game = GameState::with_config(config).unwrap();

    // Bottom of column 0 under Down, top of column 0 under Up, then the gap
    // in the middle once gravity is back to Down.
    assert_eq!(play_all(&mut game, &[0, 1]), MoveResult::GravityFlipped(Gravity::Up));
    assert_eq!(play_all(&mut game, &[0, 2]), MoveResult::GravityFlipped(Gravity::Down));
    let outcome = game.play(0).unwrap();

    assert_eq!(outcome.row, 1);
    assert_eq!(outcome.result, MoveResult::Won(Player::PlayerOne));
    assert_eq!(game.gravity(), Gravity::Down);
}

#[test]
fn test_horizontal_win_classic() {
    let mut game = GameState::with_config(GameConfig::classic()).unwrap();
    let result = play_all(&mut game, &[0, 0, 1, 1, 2, 2, 3]);

    assert_eq!(result, MoveResult::Won(Player::PlayerOne));
    for col in 0..4 {
        assert_eq!(game.board().get(5, col), Some(Cell::PlayerOne));
    }
}

#[test]
fn test_diagonal_win_classic() {
    let mut game = GameState::with_config(GameConfig::classic()).unwrap();
    // Player one builds a rising diagonal from (5,0) to (2,3).
    let result = play_all(&mut game, &[0, 1, 1, 2, 2, 3, 2, 3, 3, 6, 3]);

    assert_eq!(result, MoveResult::Won(Player::PlayerOne));
    assert_eq!(game.winner(), Some(Player::PlayerOne));
}

#[test]
fn test_anti_diagonal_win_classic() {
    let mut game = GameState::with_config(GameConfig::classic()).unwrap();
    // Mirror image: falling diagonal from (2,3) to (5,6).
    let result = play_all(&mut game, &[6, 5, 5, 4, 4, 3, 4, 3, 3, 0, 3]);

    assert_eq!(result, MoveResult::Won(Player::PlayerOne));
}

#[test]
fn test_player_two_can_win() {
    let mut game = GameState::with_config(GameConfig::classic()).unwrap();
    let result = play_all(&mut game, &[0, 1, 0, 1, 0, 1, 6, 1]);

    assert_eq!(result, MoveResult::Won(Player::PlayerTwo));
    assert_eq!(game.message(), "Player 2 wins!");
}

#[test]
fn test_column_fills_across_flip() {
    let mut game = GameState::new();

    // The first four go bottom-up from both players.
    play_all(&mut game, &[0, 0, 0, 0]);
    let fifth = game.play(0).unwrap();
    assert_eq!(fifth.row, 1);
    assert_eq!(fifth.result, MoveResult::GravityFlipped(Gravity::Up));

    let sixth = game.play(0).unwrap();
    assert_eq!(sixth.row, 0);

    assert_eq!(game.play(0), Err(MoveError::ColumnFull));
    assert_eq!(game.move_count(), 6);
    assert_eq!(game.current_player(), Player::PlayerOne);
}

#[test]
fn test_invalid_columns_rejected() {
    let mut game = GameState::new();

    for col in [-1, 7, 100, i64::MIN, i64::MAX] {
        assert_eq!(game.play(col), Err(MoveError::InvalidColumn));
    }
    assert_eq!(game.move_count(), 0);
    assert_eq!(game.current_player(), Player::PlayerOne);
}

#[test]
fn test_gravity_flips_every_five_moves() {
    let mut game = GameState::new();

    let result = play_all(&mut game, &[0, 1, 2, 3, 4]);
    assert_eq!(result, MoveResult::GravityFlipped(Gravity::Up));
    assert_eq!(game.gravity(), Gravity::Up);
    assert_eq!(game.message(), "Gravity inverted! Tokens now fall up.");
    assert_eq!(game.moves_until_flip(), Some(5));

    // Next token in a fresh column lands at the top.
    let outcome = game.play(5).unwrap();
    assert_eq!(outcome.row, 0);
    assert_eq!(game.message(), "");

    let result = play_all(&mut game, &[6, 0, 1, 2]);
    assert_eq!(result, MoveResult::GravityFlipped(Gravity::Down));
    assert_eq!(game.gravity(), Gravity::Down);
}

#[test]
fn test_finished_game_rejects_moves() {
    let mut game = GameState::with_config(GameConfig::classic()).unwrap();
    play_all(&mut game, &[0, 1, 0, 1, 0, 1, 0]);
    let before = game.snapshot();

    assert_eq!(game.play(3), Err(MoveError::GameFinished));
    // Finished takes precedence over a bad column.
    assert_eq!(game.play(42), Err(MoveError::GameFinished));
    assert_eq!(game.snapshot(), before);
}

#[test]
fn test_draw_on_small_board() {
    let config = GameConfig {
        rows: 1,
        cols: 3,
        connect: 3,
        gravity_flip_period: None,
    };
    let mut game = GameState::with_config(config).unwrap();
    let result = play_all(&mut game, &[0, 1, 2]);

    assert_eq!(result, MoveResult::Drawn);
    assert!(game.is_finished());
    assert_eq!(game.winner(), None);
    assert_eq!(game.phase(), Phase::Drawn);
    assert_eq!(game.message(), "Draw! The board is full.");
}

/// Fills the canonical board without four in a row for either player.
const FULL_BOARD_DRAW: [i64; 42] = [
    0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, 4, 5, 4, 5, 4, 5, 5,
    4, 5, 4, 5, 4, 6, 6, 6, 6, 6, 6,
];

#[test]
fn test_draw_on_full_classic_board() {
    let mut game = GameState::with_config(GameConfig::classic()).unwrap();

    let result = play_all(&mut game, &FULL_BOARD_DRAW[..41]);
    assert_eq!(result, MoveResult::Continued);
    assert!(!game.is_finished());
    assert_eq!(game.move_count(), 41);

    let outcome = game.play(FULL_BOARD_DRAW[41]).unwrap();
    assert_eq!(outcome.result, MoveResult::Drawn);
    assert_eq!(outcome.row, 0);
    assert_eq!(game.move_count(), 42);
    assert!(game.board().is_full());
    assert!(game.is_finished());
    assert_eq!(game.winner(), None);
    assert!(!game.board().has_line(Player::PlayerOne, 4));
    assert!(!game.board().has_line(Player::PlayerTwo, 4));

    assert_eq!(game.play(6), Err(MoveError::GameFinished));
}

#[test]
fn test_reset_restores_fresh_game() {
    let mut game = GameState::with_config(GameConfig::classic()).unwrap();
    play_all(&mut game, &[0, 1, 0, 1, 0, 1, 0]);
    assert!(game.is_finished());

    game.reset();

    let fresh = GameState::with_config(GameConfig::classic()).unwrap();
    assert_eq!(game.snapshot(), fresh.snapshot());
    assert!(game.play(0).is_ok());
}

#[tokio::test]
async fn test_registry_games_are_independent() {
    let registry = GameRegistry::new(GameConfig::default()).unwrap();
    let second = registry.create_game().await.unwrap();

    let default_game = registry.default_game().await;
    default_game.play(3).await.unwrap();

    let other = registry.get(second).await.unwrap();
    let snapshot = other.snapshot().await;
    assert_eq!(snapshot.move_count, 0);
    assert_eq!(default_game.snapshot().await.move_count, 1);
}
