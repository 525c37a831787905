//! Terminal play against the referee.

use shiritori::{MoveRequest, Outcome, Referee, Winner};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};

/// Plays one game over the given reader and writer.
///
/// Each line is the player's next word. Returns the final outcome, or
/// `None` if input ended first.
#[instrument(skip_all, fields(max_turns = referee.max_turns()))]
pub async fn play<R, W>(
    referee: &Referee,
    input: R,
    mut output: W,
) -> std::io::Result<Option<Outcome>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut history: Vec<String> = Vec::new();

    output
        .write_all("しりとりをはじめよう！ことばを入力してね\n> ".as_bytes())
        .await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let request = MoveRequest::new(history.clone(), line);
        let outcome = match referee.play_round(&request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(error = %err, "Round refused");
                output.write_all(format!("{}\n> ", err.prompt()).as_bytes()).await?;
                output.flush().await?;
                continue;
            }
        };

        if let Some(word) = outcome.opponent_word() {
            output.write_all(format!("AI: {}\n", word).as_bytes()).await?;
        }
        output
            .write_all(format!("{}\n", outcome.message()).as_bytes())
            .await?;

        if outcome.game_over() {
            let verdict = match outcome.winner() {
                Some(Winner::Player) => "あなたのかち",
                Some(Winner::Opponent) => "AIのかち",
                _ => "ひきわけ",
            };
            output
                .write_all(format!("[{}] {}かい\n", verdict, outcome.player_turn_count()).as_bytes())
                .await?;
            output.flush().await?;
            return Ok(Some(outcome));
        }

        history = outcome.used_words().iter().map(ToString::to_string).collect();
        output.write_all(b"> ").await?;
        output.flush().await?;
    }

    Ok(None)
}
